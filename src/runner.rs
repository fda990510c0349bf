//! Run a pip command on a background worker and stream its output.

use std::{
    collections::VecDeque,
    io::{BufRead, BufReader, Read},
    process::{Child, Stdio},
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use crate::{
    command::PipCommand,
    error::{AppError, Result},
};

/// How many stderr lines are kept for the failure message.
const STDERR_TAIL: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    pub fn text(&self) -> &str {
        match self {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr_tail: Vec<String>,
}

impl Outcome {
    pub fn message(&self, label: &str) -> String {
        if self.success {
            return format!("{label} succeeded");
        }
        let code = self
            .code
            .map(|c| format!(" (exit code {c})"))
            .unwrap_or_default();
        if self.stderr_tail.is_empty() {
            format!("{label} failed{code}")
        } else {
            format!("{label} failed{code}:\n{}", self.stderr_tail.join("\n"))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Line(OutputLine),
    Finished(Outcome),
}

/// Handle to the single background worker running a command.
pub struct Worker {
    pub command: PipCommand,
    rx: Receiver<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
    finished: bool,
}

impl Worker {
    /// Spawn the process now so a missing interpreter is reported right
    /// away, then hand the pipes to a worker thread.
    pub fn spawn(command: PipCommand) -> Result<Self> {
        let child = spawn_child(&command)?;
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let outcome = match collect(child, |line| {
                let _ = tx.send(WorkerEvent::Line(line));
            }) {
                Ok(outcome) => outcome,
                Err(e) => Outcome {
                    success: false,
                    code: None,
                    stderr_tail: vec![e.to_string()],
                },
            };
            let _ = tx.send(WorkerEvent::Finished(outcome));
        });
        Ok(Self {
            command,
            rx,
            handle: Some(handle),
            finished: false,
        })
    }

    /// Everything the worker produced since the last call, without blocking.
    pub fn drain(&mut self) -> Vec<WorkerEvent> {
        let events: Vec<_> = self.rx.try_iter().collect();
        if events
            .iter()
            .any(|e| matches!(e, WorkerEvent::Finished(_)))
        {
            self.finished = true;
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
        events
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Blocking variant used outside the TUI. `on_line` is called on the
/// current thread for every line, in arrival order.
pub fn run_streaming(command: &PipCommand, on_line: impl FnMut(OutputLine)) -> Result<Outcome> {
    let child = spawn_child(command)?;
    collect(child, on_line)
}

fn spawn_child(command: &PipCommand) -> Result<Child> {
    tracing::info!(command = %command, "running");
    command
        .to_command()
        .env("PYTHONUNBUFFERED", "1")
        .env("PIP_DISABLE_PIP_VERSION_CHECK", "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            tracing::error!(command = %command, "spawn failed: {e}");
            AppError::Other(format!("Could not start {}: {e}", command.program.display()))
        })
}

fn collect(mut child: Child, mut on_line: impl FnMut(OutputLine)) -> Result<Outcome> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Other("stdout not captured".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Other("stderr not captured".into()))?;

    let (tx, rx) = mpsc::channel();
    let out_handle = read_lines(stdout, tx.clone(), OutputLine::Stdout);
    let err_handle = read_lines(stderr, tx, OutputLine::Stderr);

    let mut tail = VecDeque::with_capacity(STDERR_TAIL);
    //ends when both readers have dropped their sender
    for line in rx {
        if let OutputLine::Stderr(s) = &line {
            if tail.len() == STDERR_TAIL {
                tail.pop_front();
            }
            tail.push_back(s.clone());
        }
        on_line(line);
    }
    let _ = out_handle.join();
    let _ = err_handle.join();

    let status = child.wait()?;
    tracing::info!(code = ?status.code(), success = status.success(), "command finished");
    Ok(Outcome {
        success: status.success(),
        code: status.code(),
        stderr_tail: tail.into(),
    })
}

/// Forward every non-blank line of `reader`, trimmed. Bytes are split at
/// `\n` so a line shows up as soon as it is complete.
fn read_lines<R>(
    reader: R,
    tx: Sender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim();
                    if !line.is_empty() && tx.send(wrap(line.to_string())).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("reading command output failed: {e}");
                    break;
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{
        path::PathBuf,
        time::{Duration, Instant},
    };

    fn sh(script: &str) -> PipCommand {
        PipCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), script.into()],
            label: "Test".into(),
        }
    }

    #[test]
    fn streams_both_pipes() {
        let mut lines = vec![];
        let outcome = run_streaming(
            &sh("echo one; echo; echo '  two  '; echo err >&2"),
            |l| lines.push(l),
        )
        .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.code, Some(0));
        let stdout: Vec<_> = lines
            .iter()
            .filter(|l| matches!(l, OutputLine::Stdout(_)))
            .map(|l| l.text())
            .collect();
        assert_eq!(stdout, vec!["one", "two"]);
        assert!(lines.contains(&OutputLine::Stderr("err".into())));
        assert_eq!(outcome.stderr_tail, vec!["err"]);
    }

    #[test]
    fn failure_keeps_exit_code_and_stderr() {
        let outcome = run_streaming(&sh("echo 'No matching distribution' >&2; exit 3"), |_| {})
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.code, Some(3));
        assert_eq!(
            outcome.message("Install foo"),
            "Install foo failed (exit code 3):\nNo matching distribution"
        );
    }

    #[test]
    fn stderr_tail_is_bounded() {
        let outcome = run_streaming(&sh("for i in $(seq 1 30); do echo $i >&2; done"), |_| {})
            .unwrap();
        assert_eq!(outcome.stderr_tail.len(), STDERR_TAIL);
        assert_eq!(outcome.stderr_tail.first().map(String::as_str), Some("11"));
    }

    #[test]
    fn carriage_return_is_trimmed() {
        let mut lines = vec![];
        run_streaming(&sh("printf 'a\\r\\nb'"), |l| lines.push(l)).unwrap();
        assert_eq!(
            lines,
            vec![
                OutputLine::Stdout("a".into()),
                OutputLine::Stdout("b".into())
            ]
        );
    }

    #[test]
    fn worker_delivers_lines_then_finished() {
        let mut worker = Worker::spawn(sh("echo hello; exit 0")).unwrap();
        let start = Instant::now();
        let mut events = vec![];
        while !worker.is_finished() && start.elapsed() < Duration::from_secs(10) {
            events.extend(worker.drain());
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(worker.is_finished());
        assert_eq!(
            events.first(),
            Some(&WorkerEvent::Line(OutputLine::Stdout("hello".into())))
        );
        assert!(matches!(
            events.last(),
            Some(WorkerEvent::Finished(Outcome { success: true, .. }))
        ));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let cmd = PipCommand {
            program: PathBuf::from("/definitely/not/python"),
            args: vec![],
            label: "Test".into(),
        };
        assert!(Worker::spawn(cmd).is_err());
    }

    #[test]
    fn success_message() {
        let outcome = Outcome {
            success: true,
            code: Some(0),
            stderr_tail: vec!["warning".into()],
        };
        assert_eq!(outcome.message("Uninstall six"), "Uninstall six succeeded");
    }
}

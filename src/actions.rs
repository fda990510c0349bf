use std::{collections::HashSet, path::PathBuf, time::Instant};

use crate::{
    command::PipCommand,
    error::{AppError, Result},
    manifest::Manifest,
    pip::{PythonEnv, combine},
    runner::{Worker, WorkerEvent},
    structs::{
        appstate::{AppState, Modal},
        event::EventCommand,
    },
    widgets::output::OutputWidget,
};

/// Checks run before every refresh, in order. The first failure wins.
fn validate(state: &AppState) -> Result<(Manifest, PythonEnv)> {
    let manifest_path = state
        .manifest_path
        .as_ref()
        .ok_or(AppError::ManifestNotSelected)?;
    let manifest = Manifest::load(manifest_path)?;

    let python_path = state
        .python_path
        .as_ref()
        .ok_or(AppError::InterpreterNotSelected)?;
    let env = PythonEnv::locate(python_path)?;
    env.verify()?;
    Ok((manifest, env))
}

/// Reload the manifest and the installed set, then rebuild both tables.
/// When the environment is unusable the tables are emptied.
pub fn refresh(state: &mut AppState) -> Result<()> {
    state.refresh_at = None;
    let (manifest, env) = match validate(state) {
        Ok(v) => v,
        Err(e) => {
            if matches!(
                e,
                AppError::InterpreterNotSelected
                    | AppError::InterpreterNotFound(_)
                    | AppError::InterpreterUnusable { .. }
            ) {
                state.env = None;
                state.installed.clear();
                state.dependencies.clear();
                update_tables(state);
            }
            tracing::warn!("refresh failed: {e}");
            return Err(e);
        }
    };

    let installed = env.installed_packages()?;
    state.dependencies = combine(&manifest.requirements, &installed);
    state.installed = installed;
    state.env = Some(env);

    if manifest.skipped.is_empty() {
        state.message.info("Refreshed");
    } else {
        let lines = manifest
            .skipped
            .iter()
            .map(|s| s.line_no.to_string())
            .collect::<Vec<_>>();
        state
            .message
            .error(format!("Skipped unreadable lines: {}", lines.join(", ")));
    }
    state.manifest = Some(manifest);
    update_tables(state);
    tracing::info!(
        requirements = state.dependencies.len(),
        installed = state.installed.len(),
        "refreshed"
    );
    Ok(())
}

pub fn update_tables(state: &mut AppState) {
    state.requirements_widget.set_data(&state.dependencies);
    let required = state
        .dependencies
        .iter()
        .map(|d| d.requirement.key())
        .collect::<HashSet<_>>();
    state
        .environment_widget
        .set_data(&state.installed, required);
}

/// Build the pip invocation for `command` against the current state.
pub fn build_command(state: &AppState, command: EventCommand) -> Result<PipCommand> {
    let env = state.env.as_ref().ok_or(AppError::InterpreterNotSelected)?;
    let python = &env.executable;
    let mirror = state.mirrors.current();
    let cmd = match command {
        EventCommand::Install(reqs) => {
            if reqs.is_empty() {
                return Err(String::from("No packages selected").into());
            }
            PipCommand::install_many(python, &reqs, mirror)
        }
        EventCommand::Uninstall(names) => {
            if names.is_empty() {
                return Err(String::from("No packages selected").into());
            }
            PipCommand::uninstall(python, &names)
        }
        EventCommand::InstallManifest => {
            let path = manifest_path(state)?;
            PipCommand::install_manifest(python, &path, mirror)
        }
        EventCommand::UninstallManifest => {
            let names = state
                .dependencies
                .iter()
                .filter(|d| d.is_installed())
                .map(|d| d.requirement.base_name())
                .collect::<Vec<_>>();
            if names.is_empty() {
                return Err(String::from("No installed requirements").into());
            }
            PipCommand::uninstall(python, &names)
        }
    };
    Ok(cmd)
}

/// The path chosen now, which may differ from the last manifest that loaded.
fn manifest_path(state: &AppState) -> Result<PathBuf> {
    let path = state
        .manifest_path
        .clone()
        .ok_or(AppError::ManifestNotSelected)?;
    if !path.is_file() {
        return Err(AppError::ManifestNotFound(path));
    }
    Ok(path)
}

/// Start `command` on the background worker and open the output dialog.
pub fn start_command(state: &mut AppState, command: EventCommand) -> Result<()> {
    if state.is_busy() {
        return Err(AppError::Busy);
    }
    let cmd = build_command(state, command)?;
    let output = OutputWidget::new(&cmd);
    state.worker = Some(Worker::spawn(cmd)?);
    state.modal = Some(Modal::Output(output));
    Ok(())
}

/// Feed new worker output into the dialog. Called on every tick.
pub fn poll_worker(state: &mut AppState) {
    let Some(worker) = state.worker.as_mut() else {
        return;
    };
    let events = worker.drain();
    let finished = worker.is_finished();
    for event in events {
        match event {
            WorkerEvent::Line(line) => {
                if let Some(Modal::Output(output)) = state.modal.as_mut() {
                    output.push(line);
                }
            }
            WorkerEvent::Finished(outcome) => {
                let label = worker_label(state);
                let message = outcome.message(&label);
                if outcome.success {
                    state.message.info(message.clone());
                    state.refresh_at = Some(Instant::now() + state.refresh_delay);
                } else {
                    //first line only, the dialog has the rest
                    let first = message.lines().next().unwrap_or_default().to_string();
                    state.message.error(first);
                }
                if let Some(Modal::Output(output)) = state.modal.as_mut() {
                    output.finish(outcome);
                }
            }
        }
    }
    if finished {
        state.worker = None;
    }
}

fn worker_label(state: &AppState) -> String {
    state
        .worker
        .as_ref()
        .map(|w| w.command.label.clone())
        .unwrap_or_default()
}

/// True once a scheduled refresh is due. The output dialog must be closed
/// first so the refresh never races a running command.
pub fn refresh_due(state: &AppState) -> bool {
    state.worker.is_none()
        && !matches!(state.modal, Some(Modal::Output(_)))
        && state.refresh_at.is_some_and(|at| Instant::now() >= at)
}

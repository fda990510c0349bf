use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use crate::{
    mirror::Mirror,
    requirement::{Requirement, Source},
    utils::quote_arg,
};

/// A pip invocation for the selected interpreter, always run as an argv
/// vector and never through a shell.
#[derive(Debug, Clone, PartialEq)]
pub struct PipCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Short description for dialogs, e.g. "Install numpy".
    pub label: String,
}

impl PipCommand {
    fn pip(python: &Path, label: String) -> Self {
        Self {
            program: python.to_path_buf(),
            args: vec!["-m".into(), "pip".into()],
            label,
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn install(python: &Path, req: &Requirement, mirror: &Mirror) -> Self {
        Self::install_many(python, std::slice::from_ref(req), mirror)
    }

    /// Install several requirements in one run. VCS and direct URL
    /// requirements do not go through the index, so the mirror is only
    /// passed when at least one requirement is resolved by name.
    pub fn install_many(python: &Path, reqs: &[Requirement], mirror: &Mirror) -> Self {
        let label = match reqs {
            [one] => format!("Install {}", one.base_name()),
            _ => format!("Install {} packages", reqs.len()),
        };
        let mut cmd = Self::pip(python, label).arg("install");
        if reqs.iter().any(|r| r.source == Source::Index) {
            cmd = cmd.args(mirror.index_args());
        }
        for req in reqs {
            if req.editable {
                cmd = cmd.arg("-e");
            }
            cmd = cmd.arg(req.install_spec());
        }
        cmd
    }

    pub fn install_manifest(python: &Path, manifest: &Path, mirror: &Mirror) -> Self {
        Self::pip(python, "Install all requirements".to_string())
            .arg("install")
            .arg("-r")
            .arg(manifest.display().to_string())
            .args(mirror.index_args())
    }

    pub fn uninstall(python: &Path, names: &[String]) -> Self {
        let label = match names {
            [one] => format!("Uninstall {one}"),
            _ => format!("Uninstall {} packages", names.len()),
        };
        Self::pip(python, label)
            .arg("uninstall")
            .arg("-y")
            .args(names.iter().cloned())
    }

    pub fn list_installed(python: &Path) -> Self {
        Self::pip(python, "List installed packages".to_string())
            .arg("list")
            .arg("--format=json")
    }

    /// Sanity check that the interpreter starts at all.
    pub fn verify(python: &Path) -> Self {
        Self {
            program: python.to_path_buf(),
            args: vec!["-c".into(), "import sys; print(sys.executable)".into()],
            label: "Check Python environment".to_string(),
        }
    }

    pub fn to_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl Display for PipCommand {
    /// The interpreter path is always quoted and shown with forward
    /// slashes, matching how the command looks in the output dialog.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let program = self.program.display().to_string().replace('\\', "/");
        write!(f, "\"{program}\"")?;
        for arg in &self.args {
            write!(f, " {}", quote_arg(arg))?;
        }
        Ok(())
    }
}

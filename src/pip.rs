use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    command::PipCommand,
    error::{AppError, Result},
    requirement::Requirement,
    structs::dependency::Dependency,
    utils::{natural_cmp, normalize_name},
};

/// Interpreter locations tried, in order, inside an environment directory.
const CANDIDATES: [&str; 6] = [
    "python.exe",
    "Scripts/python.exe",
    "python",
    "python3",
    "bin/python",
    "bin/python3",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PythonEnv {
    pub root: PathBuf,
    pub executable: PathBuf,
}

impl PythonEnv {
    /// `path` may be the interpreter itself or an environment directory.
    pub fn locate(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(AppError::InterpreterNotSelected);
        }
        if path.is_file() {
            return Ok(Self {
                root: path.parent().unwrap_or(path).to_path_buf(),
                executable: path.to_path_buf(),
            });
        }
        CANDIDATES
            .iter()
            .map(|c| path.join(c))
            .find(|p| p.is_file())
            .map(|executable| Self {
                root: path.to_path_buf(),
                executable,
            })
            .ok_or_else(|| AppError::InterpreterNotFound(path.to_path_buf()))
    }

    pub fn verify(&self) -> Result<()> {
        let output = PipCommand::verify(&self.executable)
            .to_command()
            .output()
            .map_err(|e| self.unusable(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.unusable(stderr.trim().to_string()));
        }
        let reported = String::from_utf8(output.stdout)?;
        tracing::debug!(interpreter = reported.trim(), "interpreter ok");
        Ok(())
    }

    pub fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        let cmd = PipCommand::list_installed(&self.executable);
        let output = cmd
            .to_command()
            .env("PIP_DISABLE_PIP_VERSION_CHECK", "1")
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(command = %cmd, "{}", stderr.trim());
            return Err(AppError::CommandFailed {
                command: cmd.to_string(),
                code: output.status.code(),
            });
        }
        let json = String::from_utf8(output.stdout)?;
        parse_pip_list(&json)
    }

    fn unusable(&self, reason: String) -> AppError {
        AppError::InterpreterUnusable {
            path: self.executable.clone(),
            reason,
        }
    }
}

/// Parse `pip list --format=json`. pip may print warnings before the JSON
/// array when its stdout is not a terminal, so parsing starts at the first `[`.
pub fn parse_pip_list(output: &str) -> Result<Vec<InstalledPackage>> {
    let start = output.find('[').unwrap_or(0);
    let mut packages: Vec<InstalledPackage> = serde_json::from_str(output[start..].trim())?;
    packages.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    Ok(packages)
}

/// Pair every requirement with the installed version of the same package.
pub fn combine(requirements: &[Requirement], installed: &[InstalledPackage]) -> Vec<Dependency> {
    let by_key: HashMap<String, &InstalledPackage> = installed
        .iter()
        .map(|p| (normalize_name(&p.name), p))
        .collect();
    requirements
        .iter()
        .map(|req| Dependency {
            installed: by_key.get(&req.key()).map(|p| p.version.clone()),
            requirement: req.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::dependency::Status;

    const PIP_LIST: &str = r#"[{"name": "PyYAML", "version": "6.0.1"}, {"name": "numpy", "version": "1.26.4"}, {"name": "typing_extensions", "version": "4.9.0"}, {"name": "tool", "version": "0.1"}]"#;

    fn reqs(lines: &[&str]) -> Vec<Requirement> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(i, l)| Requirement::parse(i + 1, l).unwrap())
            .collect()
    }

    #[test]
    fn parse_list() {
        let pkgs = parse_pip_list(PIP_LIST).unwrap();
        assert_eq!(pkgs.len(), 4);
        assert_eq!(pkgs[0].name, "numpy");
        assert_eq!(pkgs[1].version, "6.0.1");
    }

    #[test]
    fn parse_list_with_leading_warning() {
        let out = format!("WARNING: something odd\n{PIP_LIST}\n");
        assert_eq!(parse_pip_list(&out).unwrap().len(), 4);
        assert!(parse_pip_list("not json").is_err());
    }

    #[test]
    fn combine_matches_normalised_names() {
        let installed = parse_pip_list(PIP_LIST).unwrap();
        let deps = combine(
            &reqs(&[
                "pyyaml",
                "numpy==1.24.0",
                "typing-extensions>=4",
                "requests",
                "git+https://github.com/org/tool.git",
            ]),
            &installed,
        );
        let status: Vec<_> = deps.iter().map(|d| d.status()).collect();
        assert_eq!(
            status,
            vec![
                Status::Installed("6.0.1".into()),
                Status::Mismatch {
                    installed: "1.26.4".into(),
                    pinned: "1.24.0".into()
                },
                Status::Installed("4.9.0".into()),
                Status::Missing,
                Status::Installed("0.1".into()),
            ]
        );
    }

    #[test]
    fn locate_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PythonEnv::locate(dir.path()),
            Err(AppError::InterpreterNotFound(_))
        ));
        assert!(matches!(
            PythonEnv::locate(Path::new("")),
            Err(AppError::InterpreterNotSelected)
        ));

        std::fs::create_dir(dir.path().join("bin")).unwrap();
        let exe = dir.path().join("bin/python3");
        std::fs::write(&exe, "").unwrap();
        let env = PythonEnv::locate(dir.path()).unwrap();
        assert_eq!(env.executable, exe);
        assert_eq!(env.root, dir.path());

        let env = PythonEnv::locate(&exe).unwrap();
        assert_eq!(env.executable, exe);
    }

    #[cfg(unix)]
    #[test]
    fn broken_interpreter_is_unusable() {
        //a shell is not python, so the check script fails
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("python");
        std::os::unix::fs::symlink("/bin/sh", &exe).unwrap();

        let env = PythonEnv::locate(dir.path()).unwrap();
        assert_eq!(env.executable, exe);
        assert!(matches!(
            env.verify(),
            Err(AppError::InterpreterUnusable { .. })
        ));
    }
}

use std::fmt::Display;

use crate::requirement::Requirement;

/// A manifest requirement together with what the environment has.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub requirement: Requirement,
    pub installed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Missing,
    Installed(String),
    //only `==` pins are checked, other constraints are left to pip
    Mismatch { installed: String, pinned: String },
}

impl Dependency {
    pub fn status(&self) -> Status {
        match (&self.installed, self.requirement.pinned()) {
            (None, _) => Status::Missing,
            (Some(installed), Some(pinned)) if installed != pinned => Status::Mismatch {
                installed: installed.clone(),
                pinned: pinned.to_string(),
            },
            (Some(installed), _) => Status::Installed(installed.clone()),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Missing => write!(f, "not installed"),
            Status::Installed(v) => write!(f, "installed ({v})"),
            Status::Mismatch { installed, pinned } => {
                write!(f, "installed ({installed}), wants {pinned}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(line: &str, installed: Option<&str>) -> Dependency {
        Dependency {
            requirement: Requirement::parse(1, line).unwrap().unwrap(),
            installed: installed.map(str::to_string),
        }
    }

    #[test]
    fn status_text() {
        assert_eq!(dep("six", None).status().to_string(), "not installed");
        assert_eq!(
            dep("six>=1.0", Some("1.16.0")).status().to_string(),
            "installed (1.16.0)"
        );
        assert_eq!(
            dep("six==1.15.0", Some("1.16.0")).status().to_string(),
            "installed (1.16.0), wants 1.15.0"
        );
        assert_eq!(
            dep("six==1.16.0", Some("1.16.0")).status(),
            Status::Installed("1.16.0".into())
        );
    }
}

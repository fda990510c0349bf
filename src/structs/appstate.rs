use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use crate::{
    manifest::Manifest,
    mirror::Mirrors,
    pip::{InstalledPackage, PythonEnv},
    runner::Worker,
    structs::{dependency::Dependency, event::EventCommand, tab::Tab, timedstring::TimedString},
    widgets::{
        environment::EnvironmentWidget, output::OutputWidget, paths::PathsForm,
        requirements::RequirementsWidget,
    },
};

/// Dialog drawn on top of the tables. While one is open it receives every key.
pub enum Modal {
    Warning(String),
    Confirm(String, EventCommand),
    Output(OutputWidget),
    Paths(PathsForm),
}

pub struct AppState {
    pub manifest_path: Option<PathBuf>,
    pub python_path: Option<PathBuf>,
    pub mirrors: Mirrors,
    pub refresh_delay: Duration,

    pub manifest: Option<Manifest>,
    pub env: Option<PythonEnv>,
    pub dependencies: Vec<Dependency>,
    pub installed: Vec<InstalledPackage>,

    pub show_info: bool,
    pub show_help: bool,
    pub message: TimedString,
    pub tab: Tab,
    pub modal: Option<Modal>,

    //running command, at most one
    pub worker: Option<Worker>,
    //pending refresh after a successful command
    pub refresh_at: Option<Instant>,

    //tabs
    pub requirements_widget: RequirementsWidget,
    pub environment_widget: EnvironmentWidget,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            manifest_path: None,
            python_path: None,
            mirrors: Mirrors::default(),
            refresh_delay: Duration::from_millis(1000),
            manifest: None,
            env: None,
            dependencies: Vec::new(),
            installed: Vec::new(),
            show_info: true,
            show_help: false,
            message: TimedString::new("", Duration::from_secs(5)),
            tab: Tab::Requirements,
            modal: None,
            worker: None,
            refresh_at: None,
            requirements_widget: RequirementsWidget::default(),
            environment_widget: EnvironmentWidget::default(),
        }
    }
}

impl AppState {
    pub fn is_busy(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.modal = Some(Modal::Warning(text.into()));
    }
}

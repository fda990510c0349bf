use crate::requirement::Requirement;

#[derive(Debug, PartialEq)]
pub enum EventResult {
    None,
    Quit,
    Command(EventCommand),
    /// Ask before running the command.
    Confirm(String, EventCommand),
    NeedsRefresh,
    EditPaths,
    CycleMirror,
}

impl EventResult {
    /// Ask before uninstalling `names`.
    pub fn confirm_uninstall(names: Vec<String>) -> Self {
        let prompt = match names.as_slice() {
            [one] => format!("Uninstall {one}?"),
            _ => format!("Uninstall {} packages?", names.len()),
        };
        EventResult::Confirm(prompt, EventCommand::Uninstall(names))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventCommand {
    Install(Vec<Requirement>),
    Uninstall(Vec<String>),
    InstallManifest,
    UninstallManifest,
}

use std::fmt::Display;

#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub enum Tab {
    #[default]
    Requirements,
    Environment,
}
impl Tab {
    pub fn values() -> Vec<String> {
        vec![Tab::Requirements.to_string(), Tab::Environment.to_string()]
    }

    pub(crate) fn cycle_next(&mut self) {
        *self = match self {
            Tab::Requirements => Tab::Environment,
            Tab::Environment => Tab::Requirements,
        };
    }
}

impl Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tab::Requirements => write!(f, "Requirements"),
            Tab::Environment => write!(f, "Environment"),
        }
    }
}

//for select ratatui::Tabs
impl From<&Tab> for Option<usize> {
    fn from(tab: &Tab) -> Self {
        match tab {
            Tab::Requirements => Some(0),
            Tab::Environment => Some(1),
        }
    }
}

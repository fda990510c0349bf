use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A package index to pass to pip with `-i`. `url == None` means pip's
/// own default index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mirror {
    pub name: String,
    pub url: Option<String>,
}

impl Mirror {
    pub fn new(name: &str, url: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            url: url.map(str::to_string),
        }
    }

    pub fn index_args(&self) -> Vec<String> {
        match &self.url {
            Some(url) => vec!["-i".to_string(), url.clone()],
            None => vec![],
        }
    }
}

impl Display for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{} {}", self.name, url),
            None => write!(f, "{}", self.name),
        }
    }
}

pub fn builtin() -> Vec<Mirror> {
    vec![
        Mirror::new("default", None),
        Mirror::new("aliyun", Some("https://mirrors.aliyun.com/pypi/simple/")),
        Mirror::new("tsinghua", Some("https://pypi.tuna.tsinghua.edu.cn/simple")),
        Mirror::new("douban", Some("https://pypi.doubanio.com/simple/")),
    ]
}

/// Mirror list with a current selection, cycled from the UI.
#[derive(Debug, Clone)]
pub struct Mirrors {
    list: Vec<Mirror>,
    current: usize,
}

impl Default for Mirrors {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl Mirrors {
    pub fn new(extra: Vec<Mirror>) -> Self {
        let mut list = builtin();
        for m in extra {
            match list.iter_mut().find(|l| l.name.eq_ignore_ascii_case(&m.name)) {
                Some(existing) => *existing = m,
                None => list.push(m),
            }
        }
        Self { list, current: 0 }
    }

    /// Select by name (case-insensitive) or by URL. An unknown URL is added
    /// as a `custom` mirror; an unknown name is rejected.
    pub fn select(&mut self, wanted: &str) -> Result<()> {
        let wanted = wanted.trim();
        if let Some(i) = self.list.iter().position(|m| {
            m.name.eq_ignore_ascii_case(wanted) || m.url.as_deref() == Some(wanted)
        }) {
            self.current = i;
            return Ok(());
        }
        if wanted.starts_with("http://") || wanted.starts_with("https://") {
            self.list.push(Mirror::new("custom", Some(wanted)));
            self.current = self.list.len() - 1;
            return Ok(());
        }
        Err(AppError::Config(format!(
            "Unknown mirror '{wanted}', expected one of: {}",
            self.list
                .iter()
                .map(|m| m.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    pub fn current(&self) -> &Mirror {
        &self.list[self.current]
    }

    pub fn cycle_next(&mut self) {
        self.current = (self.current + 1) % self.list.len();
    }

    pub fn all(&self) -> &[Mirror] {
        &self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_args() {
        let mirrors = Mirrors::default();
        assert_eq!(mirrors.current().name, "default");
        assert!(mirrors.current().index_args().is_empty());
    }

    #[test]
    fn select_by_name_and_url() {
        let mut mirrors = Mirrors::default();
        mirrors.select("Tsinghua").unwrap();
        assert_eq!(
            mirrors.current().index_args(),
            vec!["-i", "https://pypi.tuna.tsinghua.edu.cn/simple"]
        );

        mirrors.select("https://mirrors.aliyun.com/pypi/simple/").unwrap();
        assert_eq!(mirrors.current().name, "aliyun");

        mirrors.select("https://pypi.example.org/simple").unwrap();
        assert_eq!(mirrors.current().name, "custom");
        assert_eq!(mirrors.all().len(), 5);

        assert!(matches!(
            mirrors.select("nowhere"),
            Err(AppError::Config(msg)) if msg.contains("tsinghua")
        ));
    }

    #[test]
    fn cycle_wraps() {
        let mut mirrors = Mirrors::default();
        for _ in 0..mirrors.all().len() {
            mirrors.cycle_next();
        }
        assert_eq!(mirrors.current().name, "default");
    }

    #[test]
    fn extra_overrides_builtin() {
        let mirrors = Mirrors::new(vec![
            Mirror::new("douban", Some("https://douban.example/simple")),
            Mirror::new("corp", Some("https://pypi.corp/simple")),
        ]);
        assert_eq!(mirrors.all().len(), 5);
        assert_eq!(
            mirrors.all()[3].url.as_deref(),
            Some("https://douban.example/simple")
        );
    }
}

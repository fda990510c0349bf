//! Parsing of single `requirements.txt` lines.

use std::fmt::Display;

use crate::{
    error::{AppError, Result},
    utils::normalize_name,
};

const VCS_PREFIXES: [&str; 4] = ["git+", "hg+", "svn+", "bzr+"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Ge,
    Le,
    Gt,
    Lt,
    Compatible,
    Arbitrary,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Compatible => "~=",
            Operator::Arbitrary => "===",
        }
    }

    /// Split a leading operator off `s`. Longer operators are tried first so
    /// `===` is not read as `==` and `>=` is not read as `>`. A lone `=` is
    /// taken as `==`.
    fn split_prefix(s: &str) -> Option<(Self, &str)> {
        const TABLE: [(&str, Operator); 9] = [
            ("===", Operator::Arbitrary),
            ("==", Operator::Eq),
            ("!=", Operator::NotEq),
            (">=", Operator::Ge),
            ("<=", Operator::Le),
            ("~=", Operator::Compatible),
            (">", Operator::Gt),
            ("<", Operator::Lt),
            ("=", Operator::Eq),
        ];
        TABLE
            .iter()
            .find_map(|(tok, op)| s.strip_prefix(*tok).map(|rest| (*op, rest)))
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub op: Operator,
    pub version: String,
}

impl Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// Where pip gets the package from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Resolved by name through the package index (or a mirror).
    Index,
    /// Version control checkout, e.g. `git+https://host/repo.git`.
    Vcs(String),
    /// PEP 508 direct reference, `name @ https://host/pkg.whl`.
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub line_no: usize,
    pub line: String,
    pub name: String,
    pub extras: Vec<String>,
    pub constraints: Vec<Constraint>,
    pub marker: Option<String>,
    pub source: Source,
    pub editable: bool,
}

impl Requirement {
    /// Parse one manifest line. Blank lines, comments and pip option lines
    /// give `Ok(None)`.
    pub fn parse(line_no: usize, raw: &str) -> Result<Option<Self>> {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            return Ok(None);
        }

        if line.starts_with('-') {
            return parse_option_line(line_no, line);
        }

        if is_vcs(line) {
            return Ok(Some(Self::vcs(line_no, line, false)));
        }

        //environment marker
        let (spec, marker) = match line.split_once(';') {
            Some((spec, marker)) => {
                let marker = marker.trim();
                (spec.trim(), (!marker.is_empty()).then(|| marker.to_string()))
            }
            None => (line, None),
        };

        //direct reference
        if let Some((name_part, url)) = spec.split_once(" @ ").or_else(|| spec.split_once('@'))
            && !name_part.contains(['<', '>', '=', '!', '~'])
        {
            let (name, extras) = split_extras(line_no, line, name_part.trim())?;
            let url = url.trim();
            if url.is_empty() {
                return Err(AppError::parse(line_no, line, "missing URL after '@'"));
            }
            return Ok(Some(Self {
                line_no,
                line: line.to_string(),
                name,
                extras,
                constraints: vec![],
                marker,
                source: Source::Url(url.to_string()),
                editable: false,
            }));
        }

        let name_end = spec
            .find(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | '(') || c.is_whitespace())
            .unwrap_or(spec.len());
        //extras bracket may contain commas but never operators, so extend past it
        let name_end = match spec.find('[') {
            Some(open) if open <= name_end => spec[open..]
                .find(']')
                .map(|close| open + close + 1)
                .ok_or_else(|| AppError::parse(line_no, line, "unclosed '['"))?,
            _ => name_end,
        };

        let (name, extras) = split_extras(line_no, line, spec[..name_end].trim())?;
        let constraints = parse_constraints(line_no, line, &spec[name_end..])?;

        Ok(Some(Self {
            line_no,
            line: line.to_string(),
            name,
            extras,
            constraints,
            marker,
            source: Source::Index,
            editable: false,
        }))
    }

    fn vcs(line_no: usize, url: &str, editable: bool) -> Self {
        Self {
            line_no,
            line: url.to_string(),
            name: url.to_string(),
            extras: vec![],
            constraints: vec![],
            marker: None,
            source: Source::Vcs(url.to_string()),
            editable,
        }
    }

    /// Package name as pip knows it, without extras. For VCS requirements
    /// it comes from `#egg=` or from the last path segment of the URL.
    pub fn base_name(&self) -> String {
        match &self.source {
            Source::Vcs(url) => vcs_project_name(url),
            _ => self.name.clone(),
        }
    }

    /// Normalised name used to match against installed packages.
    pub fn key(&self) -> String {
        normalize_name(&self.base_name())
    }

    /// The version of a single `==` pin, if that is the only constraint.
    pub fn pinned(&self) -> Option<&str> {
        match self.constraints.as_slice() {
            [Constraint {
                op: Operator::Eq,
                version,
            }] => Some(version.as_str()),
            _ => None,
        }
    }

    pub fn constraint_text(&self) -> String {
        self.constraints
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Text of the "Required" column.
    pub fn required_display(&self) -> String {
        match &self.source {
            Source::Vcs(_) => return "git repository".to_string(),
            Source::Url(url) => return format!("@ {url}"),
            Source::Index => {}
        }
        let version = self.constraint_text();
        match (&self.marker, version.is_empty()) {
            (Some(marker), true) => format!("; {marker}"),
            (Some(marker), false) => format!("{version} ; {marker}"),
            (None, true) => "any".to_string(),
            (None, false) => version,
        }
    }

    /// Single argument handed to `pip install` for this requirement.
    pub fn install_spec(&self) -> String {
        match &self.source {
            Source::Vcs(url) => url.clone(),
            Source::Url(url) => {
                let mut spec = format!("{}{} @ {url}", self.name, self.extras_text());
                if let Some(marker) = &self.marker {
                    spec.push_str(&format!(" ; {marker}"));
                }
                spec
            }
            Source::Index => {
                let mut spec =
                    format!("{}{}{}", self.name, self.extras_text(), self.constraint_text());
                if let Some(marker) = &self.marker {
                    spec.push_str(&format!(" ; {marker}"));
                }
                spec
            }
        }
    }

    fn extras_text(&self) -> String {
        if self.extras.is_empty() {
            String::new()
        } else {
            format!("[{}]", self.extras.join(","))
        }
    }
}

fn is_vcs(s: &str) -> bool {
    VCS_PREFIXES.iter().any(|p| s.starts_with(p))
}

/// pip treats `#` as a comment only at the start or after whitespace, so
/// `#egg=` fragments in URLs survive.
fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return "";
    }
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return &line[..i];
        }
    }
    line
}

fn parse_option_line(line_no: usize, line: &str) -> Result<Option<Requirement>> {
    let rest = line
        .strip_prefix("--editable")
        .or_else(|| line.strip_prefix("-e"))
        .map(|r| r.trim_start_matches('=').trim());
    match rest {
        Some(url) if is_vcs(url) => Ok(Some(Requirement::vcs(line_no, url, true))),
        Some(other) => Err(AppError::parse(
            line_no,
            line,
            format!("only version control URLs can be editable, got '{other}'"),
        )),
        None => {
            tracing::debug!(line_no, line, "skipping pip option line");
            Ok(None)
        }
    }
}

fn split_extras(line_no: usize, line: &str, s: &str) -> Result<(String, Vec<String>)> {
    let (name, extras) = match s.split_once('[') {
        Some((name, rest)) => {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| AppError::parse(line_no, line, "unclosed '['"))?;
            let extras = inner
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
            (name.trim(), extras)
        }
        None => (s, vec![]),
    };

    if name.is_empty() {
        return Err(AppError::parse(line_no, line, "missing package name"));
    }
    let valid = name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(AppError::parse(
            line_no,
            line,
            format!("invalid package name '{name}'"),
        ));
    }
    Ok((name.to_string(), extras))
}

fn parse_constraints(line_no: usize, line: &str, s: &str) -> Result<Vec<Constraint>> {
    //legacy form: pkg (>=1.0)
    let s = s.trim();
    let s = s
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(s);

    let mut constraints = vec![];
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((op, version)) = Operator::split_prefix(part) else {
            return Err(AppError::parse(
                line_no,
                line,
                format!("expected a version operator in '{part}'"),
            ));
        };
        let version = version.trim();
        if version.is_empty() {
            return Err(AppError::parse(
                line_no,
                line,
                format!("missing version after '{op}'"),
            ));
        }
        constraints.push(Constraint {
            op,
            version: version.to_string(),
        });
    }
    Ok(constraints)
}

fn vcs_project_name(url: &str) -> String {
    let (url, fragment) = url.split_once('#').unwrap_or((url, ""));
    if let Some(egg) = fragment
        .split('&')
        .find_map(|kv| kv.strip_prefix("egg="))
        .filter(|e| !e.is_empty())
    {
        return egg.to_string();
    }

    let segment = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    let segment = segment.split_once('@').map_or(segment, |(s, _)| s);
    segment
        .strip_suffix(".git")
        .unwrap_or(segment)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Requirement {
        Requirement::parse(1, line).unwrap().unwrap()
    }

    #[test]
    fn test_pinned() {
        let req = parse("requests==2.31.0");
        assert_eq!(req.name, "requests");
        assert_eq!(req.pinned(), Some("2.31.0"));
        assert_eq!(req.required_display(), "==2.31.0");
        assert_eq!(req.install_spec(), "requests==2.31.0");
        assert_eq!(req.source, Source::Index);
    }

    #[test]
    fn test_ranges() {
        let req = parse("numpy>=1.24");
        assert_eq!(req.name, "numpy");
        assert_eq!(
            req.constraints,
            vec![Constraint {
                op: Operator::Ge,
                version: "1.24".into()
            }]
        );
        assert_eq!(req.pinned(), None);
        assert_eq!(req.install_spec(), "numpy>=1.24");

        let req = parse("torch >= 2.0, < 3");
        assert_eq!(req.name, "torch");
        assert_eq!(req.constraint_text(), ">=2.0,<3");

        let req = parse("click~=8.1");
        assert_eq!(req.constraints[0].op, Operator::Compatible);

        let req = parse("six!=1.0");
        assert_eq!(req.constraints[0].op, Operator::NotEq);

        let req = parse("legacy===1.0+local");
        assert_eq!(req.constraints[0].op, Operator::Arbitrary);
        assert_eq!(req.constraints[0].version, "1.0+local");

        let req = parse("old (>=1.0)");
        assert_eq!(req.constraint_text(), ">=1.0");
    }

    #[test]
    fn test_single_equals_is_pin() {
        let req = parse("foo=1.0");
        assert_eq!(req.pinned(), Some("1.0"));
    }

    #[test]
    fn test_marker() {
        let req = parse("pywin32>=300; sys_platform == 'win32'");
        assert_eq!(req.name, "pywin32");
        assert_eq!(req.marker.as_deref(), Some("sys_platform == 'win32'"));
        assert_eq!(req.required_display(), ">=300 ; sys_platform == 'win32'");
        assert_eq!(req.install_spec(), "pywin32>=300 ; sys_platform == 'win32'");

        let req = parse("colorama ; os_name == 'nt'");
        assert_eq!(req.name, "colorama");
        assert_eq!(req.required_display(), "; os_name == 'nt'");

        let req = parse("plain;");
        assert_eq!(req.marker, None);
        assert_eq!(req.required_display(), "any");
    }

    #[test]
    fn test_git() {
        let req = parse("git+https://github.com/org/some-lib.git");
        assert!(matches!(req.source, Source::Vcs(_)));
        assert_eq!(req.name, "git+https://github.com/org/some-lib.git");
        assert_eq!(req.base_name(), "some-lib");
        assert_eq!(req.required_display(), "git repository");
        assert_eq!(req.install_spec(), "git+https://github.com/org/some-lib.git");

        let req = parse("git+https://github.com/org/repo.git@v1.2#egg=Real_Name");
        assert_eq!(req.base_name(), "Real_Name");
        assert_eq!(req.key(), "real-name");

        let req = parse("git+ssh://git@host/org/tool.git@main");
        assert_eq!(req.base_name(), "tool");
    }

    #[test]
    fn test_extras() {
        let req = parse("uvicorn[standard,watch]>=0.20");
        assert_eq!(req.name, "uvicorn");
        assert_eq!(req.extras, vec!["standard", "watch"]);
        assert_eq!(req.base_name(), "uvicorn");
        assert_eq!(req.install_spec(), "uvicorn[standard,watch]>=0.20");
    }

    #[test]
    fn test_skipped_lines() {
        assert_eq!(Requirement::parse(1, "").unwrap(), None);
        assert_eq!(Requirement::parse(1, "   ").unwrap(), None);
        assert_eq!(Requirement::parse(1, "# comment").unwrap(), None);
        assert_eq!(Requirement::parse(1, "  # indented").unwrap(), None);
        assert_eq!(Requirement::parse(1, "-r base.txt").unwrap(), None);
        assert_eq!(
            Requirement::parse(1, "--index-url https://example.org/simple").unwrap(),
            None
        );
    }

    #[test]
    fn test_inline_comment() {
        let req = parse("flask==3.0  # web");
        assert_eq!(req.install_spec(), "flask==3.0");
        assert_eq!(req.line, "flask==3.0");
    }

    #[test]
    fn test_editable() {
        let req = parse("-e git+https://github.com/org/pkg.git#egg=pkg");
        assert!(req.editable);
        assert_eq!(req.base_name(), "pkg");
        assert!(Requirement::parse(1, "-e ./local/path").is_err());

        let req = parse("--editable=git+https://github.com/org/pkg.git#egg=pkg");
        assert!(req.editable);
        assert_eq!(req.source, Source::Vcs("git+https://github.com/org/pkg.git#egg=pkg".into()));

        let req = parse("--editable git+https://github.com/org/other.git");
        assert!(req.editable);
        assert_eq!(req.base_name(), "other");
    }

    #[test]
    fn test_other_vcs() {
        for (line, name) in [
            ("hg+https://hg.example.org/tool", "tool"),
            ("svn+svn://svn.example.org/repo/trunk#egg=legacy", "legacy"),
            ("bzr+https://bzr.example.org/lib", "lib"),
        ] {
            let req = parse(line);
            assert!(matches!(req.source, Source::Vcs(_)), "{line}");
            assert!(!req.editable);
            assert_eq!(req.base_name(), name);
            assert_eq!(req.required_display(), "git repository");
        }
    }

    #[test]
    fn test_direct_url() {
        let req = parse("mylib @ https://example.org/mylib-1.0-py3-none-any.whl");
        assert_eq!(req.name, "mylib");
        assert_eq!(
            req.source,
            Source::Url("https://example.org/mylib-1.0-py3-none-any.whl".into())
        );
        assert_eq!(
            req.install_spec(),
            "mylib @ https://example.org/mylib-1.0-py3-none-any.whl"
        );
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            Requirement::parse(4, "==1.0"),
            Err(AppError::Parse { line_no: 4, .. })
        ));
        assert!(Requirement::parse(1, "pkg>=").is_err());
        assert!(Requirement::parse(1, "pkg[extra").is_err());
        assert!(Requirement::parse(1, "bad/name").is_err());
        assert!(Requirement::parse(1, "pkg 1.0").is_err());
    }
}

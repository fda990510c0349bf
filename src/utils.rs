use std::{cmp::Ordering, iter::Peekable, str::Chars};

/// Natural sort comparison of two strings, so that "1.9.0" < "1.10.0"
/// and "py2" < "py10". Digit runs compare numerically, everything else
/// compares case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let ord = digit_run(&mut a).cmp(&digit_run(&mut b));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                //digits sort before letters
                let ord = match (x.is_ascii_digit(), y.is_ascii_digit()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
                a.next();
                b.next();
            }
        }
    }
}

/// Consume a run of ascii digits. Leading zeros are dropped and the
/// remaining length compared first, so runs of any size compare correctly.
fn digit_run(it: &mut Peekable<Chars>) -> (usize, String) {
    let mut digits = String::new();
    while let Some(c) = it.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        if !(digits.is_empty() && c == '0') {
            digits.push(c);
        }
        it.next();
    }
    (digits.len(), digits)
}

/// PEP 503 name normalisation: lowercase, and any run of `-`, `_` or `.`
/// becomes a single `-`. pip reports `PyYAML` where a manifest may say
/// `pyyaml`, and `typing_extensions` where one may say `typing-extensions`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_sep = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_sep {
                out.push('-');
            }
            in_sep = true;
        } else {
            out.push(c.to_ascii_lowercase());
            in_sep = false;
        }
    }
    out
}

/// Quote a command line argument for display when it contains whitespace
/// or quotes. Only used to show commands, never to run them.
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_natural() {
        assert_eq!(natural_cmp("file2.txt", "file3.txt"), Ordering::Less);
        assert_eq!(natural_cmp("file2.txt", "file10.txt"), Ordering::Less);
        assert_eq!(natural_cmp("file10.txt", "file2.txt"), Ordering::Greater);
        assert_eq!(natural_cmp("file10.txt", "file10.txt"), Ordering::Equal);

        assert_eq!(natural_cmp("1.9.0", "1.10.0"), Ordering::Less);
        assert_eq!(natural_cmp("2.1.1", "1.1.1"), Ordering::Greater);
        assert_eq!(natural_cmp("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(natural_cmp("007", "7"), Ordering::Equal);
        assert_eq!(natural_cmp("101235555", "10406325"), Ordering::Greater);
        assert_eq!(natural_cmp("Numpy", "pandas"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_name("PyYAML"), "pyyaml");
        assert_eq!(normalize_name("typing_extensions"), "typing-extensions");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("a-_-b"), "a-b");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote_arg("install"), "install");
        assert_eq!(quote_arg("C:/My Env/req.txt"), "\"C:/My Env/req.txt\"");
        assert_eq!(
            quote_arg("pkg ; python_version < \"3.8\""),
            "\"pkg ; python_version < \\\"3.8\\\"\""
        );
    }
}

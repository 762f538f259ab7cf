//! Command line quoting for the `cmd` record entry.
//!
//! Arguments are stored single-quoted and space separated. Inside quotes
//! everything is literal; outside, a backslash escapes the next character.
//! A quote inside an argument is written as `'\''`.

/// Quote one argument.
pub fn quote_arg(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Quote and join a full command line.
pub fn join_args<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| quote_arg(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a stored command line back into arguments.
pub fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current: Option<String> = None;
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '\'' {
                in_quotes = false;
            } else {
                current.get_or_insert_with(String::new).push(c);
            }
            continue;
        }

        match c {
            ' ' | '\t' => {
                if let Some(arg) = current.take() {
                    args.push(arg);
                }
            }
            '\'' => {
                current.get_or_insert_with(String::new);
                in_quotes = true;
            }
            '\\' => {
                let arg = current.get_or_insert_with(String::new);
                if let Some(escaped) = chars.next() {
                    arg.push(escaped);
                }
            }
            _ => current.get_or_insert_with(String::new).push(c),
        }
    }

    if let Some(arg) = current {
        args.push(arg);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_quotes_every_argument() {
        let line = join_args(["/usr/bin/sentinel-service", "--config", "/etc/s.toml"]);
        assert_eq!(line, "'/usr/bin/sentinel-service' '--config' '/etc/s.toml'");
    }

    #[test]
    fn test_split_handles_spaces_and_embedded_quotes() {
        let args = vec![
            "/opt/my app/bin".to_string(),
            "it's".to_string(),
            String::new(),
        ];
        assert_eq!(split_args(&join_args(&args)), args);
    }

    #[test]
    fn test_split_unquoted_and_escaped() {
        assert_eq!(
            split_args("  run\tfast\\ now  'a b'c "),
            vec!["run", "fast now", "a bc"]
        );
    }

    #[test]
    fn test_split_empty() {
        assert!(split_args("   ").is_empty());
    }
}

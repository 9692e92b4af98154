use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot tokenize command line {cmd_line:?}: {cause}")]
pub struct TokenizeError {
    pub cmd_line: String,
    pub cause: String,
}

/// Part of `cmd_line` before the first unquoted `;`, `&`, `|`, `<` or `>`.
fn leading_simple_command(cmd_line: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    for (idx, ch) in cmd_line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ';' | '&' | '|' | '<' | '>' if !in_single && !in_double => {
                return &cmd_line[..idx];
            }
            _ => {}
        }
    }
    cmd_line
}

/// Split the first simple command of a line into shell words. Anything from
/// the first unquoted operator on is ignored.
pub fn tokenize(cmd_line: &str) -> Result<Vec<String>, TokenizeError> {
    shell_words::split(leading_simple_command(cmd_line)).map_err(|err| {
        warn!(cmd_line, error = %err, "shell word splitting failed");
        TokenizeError {
            cmd_line: cmd_line.to_string(),
            cause: err.to_string(),
        }
    })
}

/// Returns `(command, first_token)` for a command line.
///
/// Leading inline assignments (`FOO=bar make`) are skipped to find the
/// command, but never past the last token. `first_token` is always the first
/// word as written.
pub fn command_and_first_token(cmd_line: &str) -> Result<(String, String), TokenizeError> {
    let mut tokens = tokenize(cmd_line)?;
    if tokens.is_empty() {
        return Ok((String::new(), String::new()));
    }

    let last = tokens.len() - 1;
    let idx = tokens
        .iter()
        .position(|token| !token.contains('='))
        .map_or(last, |i| i.min(last));

    let command = tokens[idx].clone();
    let first_token = tokens.swap_remove(0);
    Ok((command, first_token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd_line: &str) -> (String, String) {
        command_and_first_token(cmd_line).unwrap()
    }

    #[test]
    fn test_skips_inline_assignments() {
        let (command, first) = parse("FOO=bar BAZ=qux git status");
        assert_eq!(command, "git");
        assert_eq!(first, "FOO=bar");
    }

    #[test]
    fn test_plain_command() {
        assert_eq!(parse("ls -la /tmp"), ("ls".to_string(), "ls".to_string()));
    }

    #[test]
    fn test_only_assignment() {
        assert_eq!(
            parse("FOO=bar"),
            ("FOO=bar".to_string(), "FOO=bar".to_string())
        );
    }

    #[test]
    fn test_only_assignments_stops_on_last() {
        let (command, first) = parse("A=1 B=2 C=3");
        assert_eq!(command, "C=3");
        assert_eq!(first, "A=1");
    }

    #[test]
    fn test_argument_with_equals_after_command() {
        let (command, first) = parse("dd if=/dev/zero of=out");
        assert_eq!(command, "dd");
        assert_eq!(first, "dd");
    }

    #[test]
    fn test_quoted_tokens() {
        let (command, first) = parse(r#"MSG="hello world" 'my tool' --flag"#);
        assert_eq!(first, "MSG=hello world");
        assert_eq!(command, "my tool");

        let (command, first) = parse(r"escaped\ name arg");
        assert_eq!(command, "escaped name");
        assert_eq!(first, "escaped name");
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert_eq!(parse(""), (String::new(), String::new()));
        assert_eq!(parse("   \t "), (String::new(), String::new()));
    }

    #[test]
    fn test_unbalanced_quote_is_an_error() {
        let err = command_and_first_token("echo \"unterminated").unwrap_err();
        assert_eq!(err.cmd_line, "echo \"unterminated");
        assert!(!err.cause.is_empty());

        assert!(command_and_first_token("it's").is_err());
    }

    #[test]
    fn test_stops_at_unquoted_operators() {
        assert_eq!(parse("ls|wc -l"), ("ls".to_string(), "ls".to_string()));
        assert_eq!(
            parse("FOO=1 make;echo done"),
            ("make".to_string(), "FOO=1".to_string())
        );
        assert_eq!(parse("a=1&&b"), ("a=1".to_string(), "a=1".to_string()));
        assert_eq!(parse("sort <in >out"), ("sort".to_string(), "sort".to_string()));
        assert_eq!(parse("cat log | grep x"), ("cat".to_string(), "cat".to_string()));
    }

    #[test]
    fn test_quoted_or_escaped_operators_are_kept() {
        let (command, first) = parse(r#"X="a|b" 'x;y' z"#);
        assert_eq!(first, "X=a|b");
        assert_eq!(command, "x;y");

        assert_eq!(tokenize(r"echo a\;b").unwrap(), vec!["echo", "a;b"]);
        assert_eq!(
            tokenize(r#"echo "it's|fine" ok"#).unwrap(),
            vec!["echo", "it's|fine", "ok"]
        );
    }

    #[test]
    fn test_leading_operator_yields_no_tokens() {
        assert_eq!(parse("| less"), (String::new(), String::new()));
    }

    #[test]
    fn test_first_token_matches_tokenizer() {
        for line in ["A=1 B=2 cmd x", "cmd", "X=1", "'a b'=c d", "env -i FOO=1 sh"] {
            let tokens = tokenize(line).unwrap();
            let (_, first) = parse(line);
            assert_eq!(first, tokens[0], "line {line:?}");
        }
    }
}

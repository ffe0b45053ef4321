/// Quote one argument for the platform shell used by `ShellRunner`.
#[cfg(not(windows))]
pub fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./@:+=".contains(c))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(windows)]
pub fn shell_quote(arg: &str) -> String {
    format!("\"{}\"", arg.replace('"', "\"\""))
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[test]
    fn plain_words_pass_through() {
        assert_eq!(shell_quote("origin/main"), "origin/main");
        assert_eq!(shell_quote("reports/logs/build_fix_20260101_000000.patch"), "reports/logs/build_fix_20260101_000000.patch");
    }

    #[test]
    fn specials_are_single_quoted() {
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}

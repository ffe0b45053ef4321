//! Parsers for git plumbing output. Each one assumes the machine-readable
//! form of its command, which git keeps stable across locales.

use autopilot_core::TreeCounts;

/// Parse `git rev-list --left-right --count <upstream>...<local>`.
///
/// The left column counts commits only on the upstream (behind), the right
/// column commits only on the local branch (ahead). Returns
/// `(ahead, behind)`. Anything other than exactly two unsigned integers
/// yields `(0, 0)`.
pub fn parse_left_right_counts(output: &str) -> (u32, u32) {
    let parts: Vec<&str> = output.split_whitespace().collect();
    if let [left, right] = parts.as_slice() {
        if let (Ok(behind), Ok(ahead)) = (left.parse::<u32>(), right.parse::<u32>()) {
            return (ahead, behind);
        }
    }
    (0, 0)
}

/// Number of non-blank lines, as printed by the `--name-only` listings.
pub fn count_lines(output: &str) -> u32 {
    let n = output.lines().filter(|l| !l.trim().is_empty()).count();
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Parse `git status --porcelain` (v1) output.
///
/// Column X is the index state, column Y the work-tree state. A path with
/// changes in both counts once as staged and once as unstaged. `??` is
/// untracked; `!!` (ignored) is not counted.
pub fn parse_porcelain_status(output: &str) -> TreeCounts {
    let mut counts = TreeCounts::default();
    for line in output.lines() {
        let mut chars = line.chars();
        let (Some(x), Some(y)) = (chars.next(), chars.next()) else {
            continue;
        };
        match (x, y) {
            ('?', '?') => counts.untracked += 1,
            ('!', '!') => {}
            _ => {
                if x != ' ' {
                    counts.staged += 1;
                }
                if y != ' ' {
                    counts.unstaged += 1;
                }
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_right_order_is_behind_then_ahead() {
        assert_eq!(parse_left_right_counts("3\t1\n"), (1, 3));
        assert_eq!(parse_left_right_counts("0 0"), (0, 0));
    }

    #[test]
    fn malformed_counts_are_zero() {
        assert_eq!(parse_left_right_counts(""), (0, 0));
        assert_eq!(parse_left_right_counts("5"), (0, 0));
        assert_eq!(parse_left_right_counts("1 2 3"), (0, 0));
        assert_eq!(parse_left_right_counts("fatal: no upstream"), (0, 0));
        assert_eq!(parse_left_right_counts("-1 2"), (0, 0));
    }

    #[test]
    fn count_lines_ignores_blanks() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a.ts\n\nb.ts\n"), 2);
    }

    #[test]
    fn porcelain_columns() {
        let out = "M  staged.ts\n M unstaged.ts\nMM both.ts\n?? new.ts\n!! dist/\nA  added.ts\n";
        let c = parse_porcelain_status(out);
        assert_eq!(c.staged, 3);
        assert_eq!(c.unstaged, 2);
        assert_eq!(c.untracked, 1);
    }

    #[test]
    fn porcelain_empty_is_clean() {
        assert_eq!(parse_porcelain_status(""), TreeCounts::default());
    }
}

//! Line-oriented `key = value` protocol shared by catalog listings and the
//! key/value report format.
//!
//! Lines are independent; blank lines and `#` comments are ignored. Keys are
//! dotted lowercase identifiers (`snow.fresh`), values are free text up to
//! the end of the line.

/// Splits one line into `(key, value)`, both trimmed.
///
/// Returns `None` for blank lines, comments, and lines without a `=`.
pub(crate) fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Iterates all `(key, value)` pairs of a body in line order.
pub(crate) fn pairs(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.lines().filter_map(parse_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_and_value() {
        assert_eq!(parse_line("snow.fresh = 12"), Some(("snow.fresh", "12")));
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(parse_line("  region =  Summit County  "), Some(("region", "Summit County")));
    }

    #[test]
    fn value_may_contain_equals() {
        assert_eq!(
            parse_line("location = Peak One|report?loc=peak-one"),
            Some(("location", "Peak One|report?loc=peak-one"))
        );
    }

    #[test]
    fn skips_blank_comment_and_bare_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("# a comment"), None);
        assert_eq!(parse_line("no delimiter here"), None);
        assert_eq!(parse_line("= dangling"), None);
    }

    #[test]
    fn pairs_walks_lines_in_order() {
        let body = "region = North\n# skip\nregion = South\n";
        let collected: Vec<_> = pairs(body).collect();
        assert_eq!(collected, vec![("region", "North"), ("region", "South")]);
    }
}

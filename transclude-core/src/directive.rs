//! Include directive scanning.
//!
//! Recognises `<!--#include virtual="path" -->` with at most one whitespace
//! character before `#include` and before `-->`. Anything that does not fully
//! match is left alone; a malformed directive is ordinary text, not an error.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

const INCLUDE_PATTERN: &str = r#"<!--\s?#include virtual="(.+?)"\s?-->"#;

fn include_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(INCLUDE_PATTERN).expect("include pattern is valid"))
}

/// One include directive found in a document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The full matched text, e.g. `<!--#include virtual="/a.shtml" -->`.
    pub raw: String,
    /// The referenced path exactly as written in the directive.
    pub path: String,
    /// Byte range of `raw` within the scanned body.
    pub range: Range<usize>,
}

/// Scan `body` for include directives, in order of appearance.
pub fn parse_directives(body: &str) -> Vec<Directive> {
    include_regex()
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let path = caps.get(1)?;
            Some(Directive {
                raw: whole.as_str().to_string(),
                path: path.as_str().to_string(),
                range: whole.range(),
            })
        })
        .collect()
}

/// True when `body` still contains at least one include directive.
pub fn has_directives(body: &str) -> bool {
    include_regex().is_match(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_directives_is_empty() {
        assert!(parse_directives("<html><!-- just a comment --></html>").is_empty());
        assert!(!has_directives("plain text"));
    }

    #[test]
    fn test_whitespace_variants() {
        let body = concat!(
            r#"<!--#include virtual="/a.shtml" -->"#,
            r#"<!-- #include virtual="/b.shtml"-->"#,
            r#"<!--#include virtual="c.html"-->"#,
        );
        let paths: Vec<_> = parse_directives(body).into_iter().map(|d| d.path).collect();
        assert_eq!(paths, vec!["/a.shtml", "/b.shtml", "c.html"]);
    }

    #[test]
    fn test_ranges_and_raw_text_line_up() {
        let body = r#"<div><!--#include virtual="/a.shtml" --></div>"#;
        let directives = parse_directives(body);
        assert_eq!(directives.len(), 1);
        let d = &directives[0];
        assert_eq!(&body[d.range.clone()], d.raw);
        assert_eq!(d.range.start, 5);
    }

    #[test]
    fn test_malformed_directives_are_ignored() {
        let body = concat!(
            r#"<!--  #include virtual="/two-spaces.shtml" -->"#,
            r#"<!--#INCLUDE virtual="/upper.shtml" -->"#,
            r#"<!--#include file="/file-attr.shtml" -->"#,
            r#"<!--#include virtual="" -->"#,
        );
        assert!(parse_directives(body).is_empty());
    }

    #[test]
    fn test_duplicate_paths_are_separate_matches() {
        let body = r#"<!--#include virtual="/x.html" -->|<!--#include virtual="/x.html" -->"#;
        let directives = parse_directives(body);
        assert_eq!(directives.len(), 2);
        assert!(directives[0].range.end <= directives[1].range.start);
        assert_eq!(directives[0].raw, directives[1].raw);
    }
}

//! Marker search over recovered text.
//!
//! A marker is `PREFIX{body}` where `PREFIX` comes from a small fixed set,
//! compared case-insensitively, and `body` is one or more characters other
//! than `}`.

use std::sync::OnceLock;

use regex::Regex;

/// Prefixes used by [`MarkerScanner::default`].
pub const DEFAULT_PREFIXES: &[&str] = &["CTF", "flag"];

/// Compiled marker pattern for one prefix set.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    pattern: Regex,
}

impl MarkerScanner {
    /// Builds a scanner for `prefixes`.  Prefixes are matched literally.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the combined pattern exceeds the regex
    /// engine's size limits.
    pub fn new<I, S>(prefixes: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = prefixes
            .into_iter()
            .map(|p| regex::escape(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        let pattern = if alternatives.is_empty() {
            // A position that is both a word boundary and not one: never matches.
            r"\b\B".to_string()
        } else {
            format!(r"(?i)(?:{})\{{[^}}]+\}}", alternatives.join("|"))
        };
        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }

    /// Returns every non-overlapping marker in `text`, left to right.
    pub fn find_markers<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.pattern.find_iter(text).map(|m| m.as_str()).collect()
    }
}

impl Default for MarkerScanner {
    fn default() -> Self {
        default_scanner().clone()
    }
}

fn default_scanner() -> &'static MarkerScanner {
    static SCANNER: OnceLock<MarkerScanner> = OnceLock::new();
    SCANNER.get_or_init(|| MarkerScanner::new(DEFAULT_PREFIXES).expect("valid marker regex"))
}

/// Finds `CTF{...}` and `flag{...}` markers (any letter case) in `text`.
pub fn find_markers(text: &str) -> Vec<&str> {
    default_scanner().find_markers(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_markers_case_insensitively_in_order() {
        let scanner = MarkerScanner::new(["TAG"]).unwrap();
        let found = scanner.find_markers("... TAG{abc} ... tag{xyz} ...");
        assert_eq!(found, vec!["TAG{abc}", "tag{xyz}"]);
    }

    #[test]
    fn test_default_prefixes_match_ctf_and_flag() {
        let text = "Hello flag{fake_flag_try_harder} Maybe look deeper... CTF{USB_K3yb04rd_M4st3r}";
        assert_eq!(
            find_markers(text),
            vec!["flag{fake_flag_try_harder}", "CTF{USB_K3yb04rd_M4st3r}"]
        );
    }

    #[test]
    fn test_mixed_case_prefix_matches() {
        assert_eq!(find_markers("cTf{x} FlAg{y}"), vec!["cTf{x}", "FlAg{y}"]);
    }

    #[test]
    fn test_no_markers_gives_empty_result() {
        assert!(find_markers("nothing to see here").is_empty());
        assert!(find_markers("").is_empty());
    }

    #[test]
    fn test_empty_body_and_unclosed_markers_are_not_matched() {
        assert!(find_markers("CTF{} flag{never closed").is_empty());
    }

    #[test]
    fn test_body_stops_at_first_closing_brace() {
        assert_eq!(find_markers("CTF{a}b}"), vec!["CTF{a}"]);
    }

    #[test]
    fn test_body_may_span_lines() {
        assert_eq!(find_markers("CTF{line one\nline two}"), vec!["CTF{line one\nline two}"]);
    }

    #[test]
    fn test_prefixes_are_matched_literally() {
        let scanner = MarkerScanner::new(["a.b"]).unwrap();
        assert_eq!(scanner.find_markers("axb{1} a.b{2}"), vec!["a.b{2}"]);
    }

    #[test]
    fn test_scanner_without_prefixes_matches_nothing() {
        let scanner = MarkerScanner::new(Vec::<String>::new()).unwrap();
        assert!(scanner.find_markers("CTF{x}").is_empty());
    }
}

//! Literal and regular-expression search over rendered text.
//!
//! Offsets are byte offsets into the rendered string produced by
//! [`crate::layout::extract_text`], not glyph indices.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Treat the pattern as a regular expression instead of a literal.
    pub regex: bool,
    pub case_sensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            regex: false,
            case_sensitive: true,
        }
    }
}

/// One non-overlapping match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Capture groups 1..n in regex mode; empty for literal searches.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Option<String>>,
}

/// Find every non-overlapping occurrence of `pattern` in `text`.
///
/// A malformed regular expression is returned as
/// [`crate::StrataError::Pattern`]. An empty literal matches nothing.
pub fn search_text(text: &str, pattern: &str, options: &SearchOptions) -> Result<Vec<SearchMatch>> {
    if !options.regex {
        if pattern.is_empty() {
            return Ok(Vec::new());
        }
        if options.case_sensitive {
            return Ok(text
                .match_indices(pattern)
                .map(|(start, m)| SearchMatch {
                    text: m.to_string(),
                    start,
                    end: start + m.len(),
                    groups: Vec::new(),
                })
                .collect());
        }
    }

    let source = if options.regex {
        pattern.to_string()
    } else {
        regex::escape(pattern)
    };
    let re = RegexBuilder::new(&source)
        .case_insensitive(!options.case_sensitive)
        .build()?;
    Ok(regex_matches(&re, text, options.regex))
}

fn regex_matches(re: &Regex, text: &str, with_groups: bool) -> Vec<SearchMatch> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let groups = if with_groups {
                caps.iter()
                    .skip(1)
                    .map(|g| g.map(|m| m.as_str().to_string()))
                    .collect()
            } else {
                Vec::new()
            };
            Some(SearchMatch {
                text: whole.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
                groups,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrataError;

    #[test]
    fn case_insensitive_literal() {
        let options = SearchOptions {
            case_sensitive: false,
            ..SearchOptions::default()
        };
        let matches = search_text("This is a Test.", "test", &options).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, 10);
        assert_eq!(matches[0].end, 14);
        assert_eq!(matches[0].text, "Test");
    }

    #[test]
    fn case_sensitive_literal_misses_other_case() {
        let matches = search_text("This is a Test.", "test", &SearchOptions::default()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn literal_matches_do_not_overlap() {
        let matches = search_text("aaaa", "aa", &SearchOptions::default()).unwrap();
        let spans: Vec<(usize, usize)> = matches.iter().map(|m| (m.start, m.end)).collect();
        assert_eq!(spans, vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn literal_metacharacters_are_not_regex() {
        let options = SearchOptions {
            case_sensitive: false,
            ..SearchOptions::default()
        };
        let matches = search_text("cost (USD) 1.5", "(usd)", &options).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, 5);
    }

    #[test]
    fn regex_reports_groups() {
        let options = SearchOptions {
            regex: true,
            ..SearchOptions::default()
        };
        let matches = search_text("a=1, b=22, c", r"(\w)=(\d+)?", &options).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].text, "b=22");
        assert_eq!(
            matches[1].groups,
            vec![Some("b".to_string()), Some("22".to_string())]
        );
    }

    #[test]
    fn malformed_pattern_is_an_error() {
        let options = SearchOptions {
            regex: true,
            ..SearchOptions::default()
        };
        let err = search_text("abc", "(unclosed", &options).unwrap_err();
        assert!(matches!(err, StrataError::Pattern(_)));
    }

    #[test]
    fn empty_literal_matches_nothing() {
        assert!(search_text("abc", "", &SearchOptions::default()).unwrap().is_empty());
    }
}

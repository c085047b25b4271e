//! Result parser: extracts a verdict from a free-form agent transcript.
//!
//! The agent's final message is prose that usually, but not always, embeds
//! one JSON object carrying the verdict. An ordered fallback chain guarantees
//! a usable outcome is always produced; this module never returns an error.

use serde::Deserialize;

use crate::domain::entities::Finding;

/// Which strategy of the fallback chain produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// A verdict object was located and parsed
    Strict,
    /// A JSON-like region was found but could not be parsed
    ParseError,
    /// No JSON-like region was present at all
    NoVerdict,
}

/// Best-effort verdict shape recovered from the transcript.
///
/// `score` is `None` when the strict strategy succeeded but the object
/// carried no explicit score; the runner then derives one from the findings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub passed: bool,
    pub score: Option<u8>,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    pub critical_failure: Option<String>,
    pub strategy: ParseStrategy,
}

/// Raw wire shape of the verdict object inside the transcript.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    passed: bool,
    #[serde(default, alias = "score")]
    resilience_score: Option<f64>,
    #[serde(default)]
    findings: Vec<Finding>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    critical_failure: Option<String>,
}

/// Utilities for extracting the verdict object from agent output.
pub struct ResultParser;

impl ResultParser {
    /// Parse the transcript's final text.
    ///
    /// Strategy order, first success wins:
    /// 1. Balanced-brace scan anchored on the `"passed"` key, parsed as JSON.
    /// 2. A JSON-like region was found but failed to parse.
    /// 3. No JSON-like region at all.
    pub fn parse(text: &str) -> ParsedVerdict {
        match Self::extract_verdict_region(text) {
            Some(region) => match serde_json::from_str::<RawVerdict>(region) {
                Ok(raw) => ParsedVerdict {
                    passed: raw.passed,
                    score: raw
                        .resilience_score
                        .map(|s| s.round().clamp(0.0, 100.0) as u8),
                    findings: raw.findings,
                    recommendations: raw.recommendations,
                    critical_failure: raw.critical_failure,
                    strategy: ParseStrategy::Strict,
                },
                Err(_) => Self::parse_error_fallback(),
            },
            None if Self::has_verdict_anchor(text) => Self::parse_error_fallback(),
            None => Self::no_verdict_fallback(),
        }
    }

    fn parse_error_fallback() -> ParsedVerdict {
        ParsedVerdict {
            passed: false,
            score: Some(30),
            findings: vec![Finding::titled("Audit parsing failed")],
            recommendations: vec!["Review agent logs".to_string()],
            critical_failure: Some("Could not parse audit results".to_string()),
            strategy: ParseStrategy::ParseError,
        }
    }

    fn no_verdict_fallback() -> ParsedVerdict {
        ParsedVerdict {
            passed: false,
            score: Some(50),
            findings: vec![Finding::titled("Unable to complete full audit")],
            recommendations: vec!["Manual review recommended".to_string()],
            critical_failure: None,
            strategy: ParseStrategy::NoVerdict,
        }
    }

    /// Whether the text contains a brace-anchored `"passed"` key, i.e. a
    /// JSON-like region even if it never closes.
    fn has_verdict_anchor(text: &str) -> bool {
        text.find("\"passed\"")
            .map(|anchor| text[..anchor].contains('{'))
            .unwrap_or(false)
    }

    /// Locate the balanced JSON object enclosing the `"passed"` key.
    fn extract_verdict_region(text: &str) -> Option<&str> {
        let anchor = text.find("\"passed\"")?;
        let open = text[..anchor].rfind('{')?;
        Self::balanced_object(text, open)
    }

    /// String-aware balanced-brace scan starting at `open` (a `{`).
    fn balanced_object(text: &str, open: usize) -> Option<&str> {
        let bytes = text.as_bytes();
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, &b) in bytes.iter().enumerate().skip(open) {
            if in_string {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_string = false;
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[open..=i]);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

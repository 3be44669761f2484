//! Blocking Signal Patterns
//!
//! A fixed set of textual patterns that mark an executor transcript as
//! hard-blocked: explicit error markers, missing resources, permission
//! problems, schema violations, and quota exhaustion. Scanned over
//! streamed chunks (to abort policy-restricted executors mid-flight) and
//! over final output (to classify failures).

use regex::Regex;

/// Compiled blocking-signal pattern set.
#[derive(Debug)]
pub struct BlockerSet {
    patterns: Vec<Regex>,
}

const BLOCKER_PATTERNS: &[&str] = &[
    // Explicit error markers at line starts
    r"(?m)^\s*(?:ERROR|FATAL)[:\s]",
    // Missing resources
    r"(?i)no such file or directory",
    r"(?i)\bfile not found\b",
    r"(?i)command not found",
    r"(?i)missing required \w+",
    // Permissions
    r"(?i)permission denied",
    r"(?i)access denied",
    r"(?i)\bunauthorized\b",
    // Schema / constraint violations
    r"(?i)constraint violation",
    r"(?i)schema validation failed",
    // Quota and rate limits
    r"(?i)quota exceeded",
    r"(?i)rate limit exceeded",
    r"(?i)too many requests",
    r"(?i)resource[ _]exhausted",
];

impl BlockerSet {
    /// Build the standard pattern set.
    pub fn standard() -> Self {
        Self {
            patterns: BLOCKER_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }

    /// Return the first blocking signal found in the text, if any.
    pub fn scan(&self, text: &str) -> Option<String> {
        for pattern in &self.patterns {
            if let Some(found) = pattern.find(text) {
                return Some(found.as_str().trim().to_string());
            }
        }
        None
    }

    /// Whether the text contains any blocking signal.
    pub fn is_blocked(&self, text: &str) -> bool {
        self.scan(text).is_some()
    }
}

impl Default for BlockerSet {
    fn default() -> Self {
        Self::standard()
    }
}

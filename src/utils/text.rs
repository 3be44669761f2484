//! Text Helpers
//!
//! Character-budget clipping used for discussion transcripts and advisory
//! log excerpts. Clips on char boundaries, never mid-codepoint.

/// Clip a string to at most `max_chars` characters, appending a marker
/// when content was dropped.
pub fn clip_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max_chars).collect();
    format!("{}\n[...clipped...]", clipped)
}

/// Produce a short single-line excerpt suitable for log lines.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let head: String = flat.chars().take(max_chars).collect();
    format!("{}...", head)
}

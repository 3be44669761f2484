//! Executor Catalog
//!
//! Static metadata for the three executor families: canonical aliases,
//! inline mention markers, fallback orders, and policy flags. Routing,
//! the strategies, and the pick partition all consult this catalog so
//! family facts live in one place.

use regex::Regex;

use crate::models::ExecutorKind;

/// The executor tasks fall back to on ties and no-match classifications.
pub const RELIABILITY_DEFAULT: ExecutorKind = ExecutorKind::Claude;

/// Static profile of one executor family.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorProfile {
    /// Which family this profile describes
    pub kind: ExecutorKind,
    /// Stable agent identifier reported in route decisions
    pub agent_id: &'static str,
    /// Display name for logs and notes
    pub display_name: &'static str,
    /// Section/tag aliases, lowercase. The claude set carries two common
    /// misspellings so a typo in a section heading still routes.
    pub aliases: &'static [&'static str],
    /// Inline mention marker pattern (case-insensitive, word-bounded)
    pub mention_pattern: &'static str,
    /// Executors to try after this one fails, in order
    pub fallback_order: [ExecutorKind; 2],
    /// Policy-restricted families abort mid-stream on hard blockers
    /// instead of finishing the invocation (strict routes only)
    pub policy_restricted: bool,
}

const CLAUDE_PROFILE: ExecutorProfile = ExecutorProfile {
    kind: ExecutorKind::Claude,
    agent_id: "claude-code",
    display_name: "Claude Code",
    aliases: &["claude", "cluade", "calude"],
    mention_pattern: r"(?i)@claude\b",
    fallback_order: [ExecutorKind::Codex, ExecutorKind::Gemini],
    policy_restricted: false,
};

const CODEX_PROFILE: ExecutorProfile = ExecutorProfile {
    kind: ExecutorKind::Codex,
    agent_id: "codex-cli",
    display_name: "Codex",
    aliases: &["codex", "oai"],
    mention_pattern: r"(?i)@codex\b",
    fallback_order: [ExecutorKind::Claude, ExecutorKind::Gemini],
    policy_restricted: false,
};

const GEMINI_PROFILE: ExecutorProfile = ExecutorProfile {
    kind: ExecutorKind::Gemini,
    agent_id: "gemini-cli",
    display_name: "Gemini",
    aliases: &["gemini", "gmn"],
    mention_pattern: r"(?i)@gemini\b",
    fallback_order: [ExecutorKind::Claude, ExecutorKind::Codex],
    policy_restricted: true,
};

/// Profile for one executor family.
pub fn profile(kind: ExecutorKind) -> &'static ExecutorProfile {
    match kind {
        ExecutorKind::Claude => &CLAUDE_PROFILE,
        ExecutorKind::Codex => &CODEX_PROFILE,
        ExecutorKind::Gemini => &GEMINI_PROFILE,
    }
}

/// Fallback order for one executor family.
pub fn fallback_order(kind: ExecutorKind) -> [ExecutorKind; 2] {
    profile(kind).fallback_order
}

/// Whether a family must abort mid-stream on hard blockers.
pub fn is_policy_restricted(kind: ExecutorKind) -> bool {
    profile(kind).policy_restricted
}

/// Compiled mention marker for one family.
///
/// Compiled per call; routing runs once per cycle so this is not hot.
/// The patterns are fixed literals, so `None` never happens in practice.
pub fn mention_regex(kind: ExecutorKind) -> Option<Regex> {
    Regex::new(profile(kind).mention_pattern).ok()
}

/// Match a section or tag label against the family alias sets.
///
/// Case-insensitive, whitespace-trimmed; families are checked in the
/// fixed priority order claude, codex, gemini.
pub fn match_alias(label: &str) -> Option<ExecutorKind> {
    let normalized = label.trim().to_lowercase();
    for kind in ExecutorKind::ALL {
        if profile(kind).aliases.contains(&normalized.as_str()) {
            return Some(kind);
        }
    }
    None
}

/// Whether a section label belongs to any recognized family.
///
/// Tasks under unrecognized sections are skipped by the pick routine.
pub fn is_recognized_section(label: &str) -> bool {
    match_alias(label).is_some()
}

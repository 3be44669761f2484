//! Skill Rule Tables
//!
//! Each executor family owns an ordered table of weighted skill rules.
//! A rule is a label, a weight, and a list of matchers; an executor's
//! affinity score for a task is the sum over its rules of
//! weight x matching-matcher-count. The matcher is a small predicate
//! enum so the matching primitive can be swapped without touching the
//! scoring algorithm.

use regex::Regex;

use crate::models::ExecutorKind;

/// One matching predicate inside a skill rule.
#[derive(Debug, Clone)]
pub enum RuleMatcher {
    /// Case-insensitive substring containment
    Substring(String),
    /// Compiled regex match
    Pattern(Regex),
}

impl RuleMatcher {
    /// Substring matcher (stored lowercase).
    pub fn substring(needle: impl Into<String>) -> Self {
        RuleMatcher::Substring(needle.into().to_lowercase())
    }

    /// Regex matcher; invalid patterns are dropped by the table builder.
    pub fn pattern(raw: &str) -> Option<Self> {
        Regex::new(raw).ok().map(RuleMatcher::Pattern)
    }

    /// Whether this matcher fires on the given text.
    ///
    /// `lowered` must be the lowercase form of the original text;
    /// substring matchers use it, regex matchers carry `(?i)` themselves
    /// and run on the original.
    pub fn matches(&self, original: &str, lowered: &str) -> bool {
        match self {
            RuleMatcher::Substring(needle) => lowered.contains(needle.as_str()),
            RuleMatcher::Pattern(regex) => regex.is_match(original),
        }
    }
}

/// A weighted skill rule owned by one executor family.
#[derive(Debug, Clone)]
pub struct SkillRule {
    /// Skill label cited in route reasons (e.g. "refactoring")
    pub label: &'static str,
    /// Weight multiplied by the number of matching matchers
    pub weight: u32,
    /// Matchers evaluated independently
    pub matchers: Vec<RuleMatcher>,
}

impl SkillRule {
    fn new(label: &'static str, weight: u32, matchers: Vec<RuleMatcher>) -> Self {
        Self {
            label,
            weight,
            matchers,
        }
    }

    /// Number of matchers that fire on the text.
    pub fn match_count(&self, original: &str, lowered: &str) -> u32 {
        self.matchers
            .iter()
            .filter(|m| m.matches(original, lowered))
            .count() as u32
    }

    /// weight x match-count contribution of this rule.
    pub fn score(&self, original: &str, lowered: &str) -> u32 {
        self.weight * self.match_count(original, lowered)
    }
}

/// Score breakdown for one executor over one task text.
#[derive(Debug, Clone, Default)]
pub struct ExecutorScore {
    /// Total affinity score (sum over all rules)
    pub total: u32,
    /// Highest-scoring single rule: (label, rule score)
    pub top_rule: Option<(&'static str, u32)>,
    /// Labels of every rule that contributed at least one match
    pub matched_labels: Vec<&'static str>,
}

/// Score one executor's rule table against task text.
pub fn score_executor(kind: ExecutorKind, original: &str, lowered: &str) -> ExecutorScore {
    let mut result = ExecutorScore::default();
    for rule in skill_rules(kind) {
        let rule_score = rule.score(original, lowered);
        if rule_score == 0 {
            continue;
        }
        result.total += rule_score;
        result.matched_labels.push(rule.label);
        match result.top_rule {
            // Strictly-greater keeps the earliest rule on equal scores
            Some((_, best)) if rule_score <= best => {}
            _ => result.top_rule = Some((rule.label, rule_score)),
        }
    }
    result
}

/// The skill rule table for one executor family.
pub fn skill_rules(kind: ExecutorKind) -> Vec<SkillRule> {
    match kind {
        ExecutorKind::Claude => vec![
            SkillRule::new(
                "refactoring",
                3,
                vec![
                    RuleMatcher::substring("refactor"),
                    RuleMatcher::substring("restructure"),
                    RuleMatcher::substring("clean up"),
                    RuleMatcher::substring("simplify"),
                    RuleMatcher::substring("tech debt"),
                ],
            ),
            SkillRule::new(
                "architecture",
                3,
                vec![
                    RuleMatcher::substring("architecture"),
                    RuleMatcher::substring("system design"),
                    RuleMatcher::substring("design doc"),
                    RuleMatcher::substring("adr"),
                ],
            ),
            SkillRule::new(
                "review",
                2,
                // Word-bounded so "preview" does not count as a review task
                vec![
                    RuleMatcher::pattern(r"(?i)\breview\b"),
                    RuleMatcher::pattern(r"(?i)\baudit\b"),
                ]
                .into_iter()
                .flatten()
                .collect(),
            ),
            SkillRule::new(
                "writing",
                1,
                vec![
                    RuleMatcher::substring("readme"),
                    RuleMatcher::substring("documentation"),
                    RuleMatcher::substring("changelog"),
                    RuleMatcher::substring("guide"),
                ],
            ),
        ],
        ExecutorKind::Codex => vec![
            SkillRule::new(
                "implementation",
                3,
                vec![
                    RuleMatcher::substring("implement"),
                    RuleMatcher::substring("feature"),
                    RuleMatcher::substring("endpoint"),
                    RuleMatcher::substring("prototype"),
                ],
            ),
            SkillRule::new(
                "testing",
                3,
                // Word-bounded so "latest" or "greatest" does not score
                vec![
                    RuleMatcher::pattern(r"(?i)\btests?\b"),
                    Some(RuleMatcher::substring("coverage")),
                    Some(RuleMatcher::substring("regression")),
                    Some(RuleMatcher::substring("e2e")),
                ]
                .into_iter()
                .flatten()
                .collect(),
            ),
            SkillRule::new(
                "bugfix",
                2,
                vec![
                    RuleMatcher::substring("fix"),
                    RuleMatcher::substring("bug"),
                    RuleMatcher::substring("defect"),
                    RuleMatcher::substring("crash"),
                ],
            ),
            SkillRule::new(
                "automation",
                2,
                vec![
                    RuleMatcher::substring("script"),
                    RuleMatcher::substring("automation"),
                    RuleMatcher::substring("cron"),
                    RuleMatcher::substring("ci pipeline"),
                ],
            ),
        ],
        ExecutorKind::Gemini => vec![
            SkillRule::new(
                "research",
                3,
                vec![
                    RuleMatcher::substring("research"),
                    RuleMatcher::substring("investigate"),
                    RuleMatcher::substring("compare"),
                    RuleMatcher::substring("evaluate"),
                ],
            ),
            SkillRule::new(
                "data",
                3,
                vec![
                    RuleMatcher::substring("dataset"),
                    RuleMatcher::substring("csv"),
                    RuleMatcher::substring("data analysis"),
                    RuleMatcher::substring("sql"),
                ],
            ),
            SkillRule::new(
                "frontend",
                2,
                vec![
                    RuleMatcher::substring("css"),
                    RuleMatcher::substring("layout"),
                    RuleMatcher::substring("screenshot"),
                    RuleMatcher::substring("mockup"),
                ],
            ),
            SkillRule::new(
                "translation",
                1,
                vec![
                    RuleMatcher::substring("translate"),
                    RuleMatcher::substring("localize"),
                    RuleMatcher::substring("i18n"),
                ],
            ),
        ],
    }
}

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_KEY: &str = "default";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuleParseError {
    #[error("Entry `{0}` is not of the form subject=rule")]
    MalformedEntry(String),

    #[error("Unknown answer rule `{0}`, expected exact, case-insensitive or numeric:<tolerance>")]
    UnknownRule(String),

    #[error("Invalid numeric tolerance `{0}`")]
    InvalidTolerance(String),
}

/// How a student answer is compared with an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnswerRule {
    /// Byte equality after trimming surrounding whitespace
    Exact,
    /// Equality after trimming, collapsing inner whitespace and lowercasing
    CaseInsensitive,
    /// Numbers within `tolerance` of each other. Non-numeric answers fall back
    /// to [`AnswerRule::CaseInsensitive`].
    NumericTolerance { tolerance: f64 },
}

impl AnswerRule {
    pub fn matches(&self, student_answer: &str, accepted_answer: &str) -> bool {
        match self {
            AnswerRule::Exact => student_answer.trim() == accepted_answer.trim(),
            AnswerRule::CaseInsensitive => normalize_text(student_answer) == normalize_text(accepted_answer),
            AnswerRule::NumericTolerance { tolerance } => {
                match (parse_number(student_answer), parse_number(accepted_answer)) {
                    (Some(student), Some(accepted)) => (student - accepted).abs() <= *tolerance,
                    _ => AnswerRule::CaseInsensitive.matches(student_answer, accepted_answer),
                }
            }
        }
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

impl fmt::Display for AnswerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerRule::Exact => write!(f, "exact"),
            AnswerRule::CaseInsensitive => write!(f, "case-insensitive"),
            AnswerRule::NumericTolerance { tolerance } => write!(f, "numeric:{tolerance}"),
        }
    }
}

impl FromStr for AnswerRule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rule = s.trim().to_lowercase();
        match rule.as_str() {
            "exact" => Ok(AnswerRule::Exact),
            "case-insensitive" => Ok(AnswerRule::CaseInsensitive),
            _ => {
                let Some(tolerance) = rule.strip_prefix("numeric:") else {
                    return Err(RuleParseError::UnknownRule(s.trim().to_string()));
                };
                let tolerance = tolerance
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite() && *value >= 0.0)
                    .ok_or_else(|| RuleParseError::InvalidTolerance(tolerance.trim().to_string()))?;
                Ok(AnswerRule::NumericTolerance { tolerance })
            }
        }
    }
}

/// Answer rules per subject, with a fallback for subjects not listed.
///
/// Parsed from comma separated `subject=rule` entries, e.g.
/// `default=case-insensitive,math=numeric:0.01`. Subjects are matched
/// case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingRules {
    default: AnswerRule,
    per_subject: HashMap<String, AnswerRule>,
}

impl GradingRules {
    pub fn new(default: AnswerRule) -> Self {
        Self { default, per_subject: HashMap::new() }
    }

    pub fn with_subject(mut self, subject: &str, rule: AnswerRule) -> Self {
        self.per_subject.insert(subject.trim().to_lowercase(), rule);
        self
    }

    pub fn rule_for(&self, subject: &str) -> AnswerRule {
        self.per_subject.get(&subject.trim().to_lowercase()).copied().unwrap_or(self.default)
    }
}

impl Default for GradingRules {
    fn default() -> Self {
        Self::new(AnswerRule::CaseInsensitive)
    }
}

impl FromStr for GradingRules {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rules = GradingRules::default();
        for entry in s.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let (subject, rule) =
                entry.split_once('=').ok_or_else(|| RuleParseError::MalformedEntry(entry.to_string()))?;
            let subject = subject.trim();
            if subject.is_empty() {
                return Err(RuleParseError::MalformedEntry(entry.to_string()));
            }
            let rule = AnswerRule::from_str(rule)?;
            if subject.eq_ignore_ascii_case(DEFAULT_KEY) {
                rules.default = rule;
            } else {
                rules = rules.with_subject(subject, rule);
            }
        }
        Ok(rules)
    }
}

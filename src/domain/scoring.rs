///! Deterministic scoring for the two-round self-assessment
///! - Round 1: 10 questions (sleep hours is computed, the rest are lookups)
///! - Round 2: 7 questions, all lookups
///! - Point values live in [2, 5]; unknown answers default to the midpoint
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// One round of submitted answers, keyed by question id ("q1", "q2", ...).
pub type AnswerSet = HashMap<String, RawAnswer>;

/// Points awarded when a known question receives a value outside its table.
const DEFAULT_POINTS: f64 = 3.0;

/// A respondent's value for one question: either a 1-5 Likert integer or a
/// categorical label such as "Often".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    Scale(i64),
    Label(String),
}

impl RawAnswer {
    /// Key used against a lookup table. Integer answers are normalized to
    /// their decimal string so `3` and `"3"` select the same entry.
    fn lookup_key(&self) -> Cow<'_, str> {
        match self {
            RawAnswer::Scale(n) => Cow::Owned(n.to_string()),
            RawAnswer::Label(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Lenient integer reading for computed rules: leading sign and digits
    /// are honored, anything non-numeric reads as 0.
    fn as_int(&self) -> i64 {
        match self {
            RawAnswer::Scale(n) => *n,
            RawAnswer::Label(s) => parse_leading_int(s),
        }
    }
}

fn parse_leading_int(raw: &str) -> i64 {
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

/// Scoring rule for a single question.
pub enum QuestionRule {
    /// Fixed value -> points table.
    Lookup(HashMap<&'static str, f64>),
    /// Points derived from the raw answer (sleep hours).
    Computed(fn(&RawAnswer) -> f64),
}

impl QuestionRule {
    fn points(&self, answer: &RawAnswer) -> f64 {
        match self {
            QuestionRule::Lookup(table) => table
                .get(answer.lookup_key().as_ref())
                .copied()
                .unwrap_or(DEFAULT_POINTS),
            QuestionRule::Computed(evaluate) => evaluate(answer),
        }
    }
}

/// Per-round rule set, keyed by question id. Fixed at startup, never
/// mutated afterwards.
pub struct RuleTable {
    questions: HashMap<&'static str, QuestionRule>,
}

impl RuleTable {
    /// Sum points over an answer set. Question ids without a rule are
    /// skipped so callers may send extra fields without penalty.
    fn tally(&self, answers: &AnswerSet) -> f64 {
        answers
            .iter()
            .filter_map(|(qid, answer)| {
                self.questions
                    .get(qid.as_str())
                    .map(|rule| rule.points(answer))
            })
            .sum()
    }
}

/// Both rounds' rule tables. Built once in `main` and injected through
/// application state.
pub struct ScoringRules {
    pub round1: RuleTable,
    pub round2: RuleTable,
}

fn lookup(entries: &[(&'static str, f64)]) -> QuestionRule {
    QuestionRule::Lookup(entries.iter().copied().collect())
}

/// Sleep-hours rule: fewer hours score higher risk. Non-numeric input
/// reads as 0 hours. Negative values fall through to a neutral 4.
fn sleep_hours_points(answer: &RawAnswer) -> f64 {
    match answer.as_int() {
        0..=3 => 5.0,
        4..=5 => 4.0,
        6..=7 => 3.0,
        h if h >= 8 => 2.0,
        _ => 4.0,
    }
}

impl ScoringRules {
    /// The deployed question set. Round 1 maxes out at exactly 50 points;
    /// round 2 at 35 (7 questions capped at 5 points each).
    pub fn fixed() -> Self {
        let likert_ascending: &[(&'static str, f64)] =
            &[("1", 2.0), ("2", 3.0), ("3", 4.0), ("4", 5.0), ("5", 5.0)];
        let likert_reversed: &[(&'static str, f64)] =
            &[("1", 5.0), ("2", 4.0), ("3", 3.0), ("4", 2.0), ("5", 2.0)];

        let round1 = RuleTable {
            questions: HashMap::from([
                ("q1", lookup(likert_ascending)),
                ("q2", QuestionRule::Computed(sleep_hours_points)),
                ("q3", lookup(likert_ascending)),
                ("q4", lookup(likert_reversed)),
                (
                    "q5",
                    lookup(&[
                        ("Yes, definitely", 2.0),
                        ("Somewhat", 4.0),
                        ("No, not really", 5.0),
                    ]),
                ),
                ("q6", lookup(likert_ascending)),
                (
                    "q7",
                    lookup(&[("Normal", 2.0), ("Poor", 5.0), ("Overeating", 5.0)]),
                ),
                (
                    "q8",
                    lookup(&[
                        ("Rarely", 2.0),
                        ("Sometimes", 3.0),
                        ("Often", 4.0),
                        ("Constantly", 5.0),
                    ]),
                ),
                (
                    "q9",
                    lookup(&[
                        ("Daily", 2.0),
                        ("3-4 times/week", 3.0),
                        ("1-2 times/week", 4.0),
                        ("Rarely", 5.0),
                    ]),
                ),
                ("q10", lookup(likert_reversed)),
            ]),
        };

        let often_scale: &[(&'static str, f64)] =
            &[("Never", 2.0), ("Sometimes", 4.0), ("Often", 5.0)];

        let round2 = RuleTable {
            questions: HashMap::from([
                (
                    "q1",
                    lookup(&[
                        ("Not at all", 2.0),
                        ("Mild", 3.0),
                        ("Moderate", 4.0),
                        ("Severe", 5.0),
                    ]),
                ),
                ("q2", lookup(likert_reversed)),
                ("q3", lookup(often_scale)),
                (
                    "q4",
                    lookup(&[("Not at all", 2.0), ("Sometimes", 4.0), ("Often", 5.0)]),
                ),
                ("q5", lookup(often_scale)),
                (
                    "q6",
                    lookup(&[
                        ("Never", 2.0),
                        ("Rarely", 3.0),
                        ("Sometimes", 5.0),
                        ("Often", 5.0),
                    ]),
                ),
                (
                    "q7",
                    lookup(&[("Regularly", 2.0), ("Occasionally", 4.0), ("Never", 5.0)]),
                ),
            ]),
        };

        ScoringRules { round1, round2 }
    }
}

/// Three-tier classification of the combined total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Normal,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn classify(total_score: i32) -> Self {
        if total_score < 50 {
            RiskLevel::Normal
        } else if total_score <= 80 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "normal",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub round1_score: i32,
    pub round2_score: i32,
    pub total_score: i32,
    pub risk_level: RiskLevel,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("missing {0}")]
    MissingAnswers(&'static str),
}

/// Score one complete assessment attempt.
///
/// Fails only when an answer set is absent entirely. Empty sets score 0,
/// unknown question ids are skipped, and unknown values fall back to the
/// midpoint, so imperfect input still yields a score.
///
/// The total is rounded once from the unrounded sub-scores while the
/// per-round fields are rounded independently; with the current integer
/// point tables both paths agree, but the order is kept as deployed.
pub fn score(
    rules: &ScoringRules,
    round1_answers: Option<&AnswerSet>,
    round2_answers: Option<&AnswerSet>,
) -> Result<ScoreResult, ScoreError> {
    let round1_answers = round1_answers.ok_or(ScoreError::MissingAnswers("round1_answers"))?;
    let round2_answers = round2_answers.ok_or(ScoreError::MissingAnswers("round2_answers"))?;

    let round1 = rules.round1.tally(round1_answers);
    let round2 = rules.round2.tally(round2_answers);

    let total_score = (round1 + round2).round() as i32;

    Ok(ScoreResult {
        round1_score: round1.round() as i32,
        round2_score: round2.round() as i32,
        total_score,
        risk_level: RiskLevel::classify(total_score),
    })
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The six pulse dimensions, in canonical display order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PulseDimension {
    RoleClarity,
    TeamCollaboration,
    WorkLifeBalance,
    LeadershipSupport,
    CareerGrowth,
    OverallWellbeing,
}

impl PulseDimension {
    pub const ALL: [PulseDimension; 6] = [
        PulseDimension::RoleClarity,
        PulseDimension::TeamCollaboration,
        PulseDimension::WorkLifeBalance,
        PulseDimension::LeadershipSupport,
        PulseDimension::CareerGrowth,
        PulseDimension::OverallWellbeing,
    ];

    /// Current key used by the survey form.
    pub fn new_key(&self) -> &'static str {
        match self {
            PulseDimension::RoleClarity => "clarity_of_role",
            PulseDimension::TeamCollaboration => "collaboration_team_flow",
            PulseDimension::WorkLifeBalance => "balance_energy",
            PulseDimension::LeadershipSupport => "leadership_support",
            PulseDimension::CareerGrowth => "growth_future",
            PulseDimension::OverallWellbeing => "wellbeing_at_work",
        }
    }

    /// Key used by submissions written before the questions were renamed.
    pub fn old_key(&self) -> &'static str {
        match self {
            PulseDimension::RoleClarity => "work_satisfaction",
            PulseDimension::TeamCollaboration => "team_collaboration",
            PulseDimension::WorkLifeBalance => "work_life_balance",
            PulseDimension::LeadershipSupport => "management_support",
            PulseDimension::CareerGrowth => "career_growth",
            PulseDimension::OverallWellbeing => "overall_wellbeing",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PulseDimension::RoleClarity => "Clarity of Role",
            PulseDimension::TeamCollaboration => "Team Collaboration",
            PulseDimension::WorkLifeBalance => "Work-Life Balance",
            PulseDimension::LeadershipSupport => "Leadership Support",
            PulseDimension::CareerGrowth => "Career Growth",
            PulseDimension::OverallWellbeing => "Overall Wellbeing",
        }
    }
}

/// One free-text survey prompt. `old_key` is `None` for questions introduced
/// after the rename (they have no legacy data to fall back to).
pub struct TextQuestion {
    pub new_key: &'static str,
    pub old_key: Option<&'static str>,
    pub label: &'static str,
    pub required: bool,
    pub max_len: usize,
}

pub const STANDARD_TEXT_CAP: usize = 1000;
pub const FULL_REVIEW_CAP: usize = 2000;
pub const MIN_TEXT_LEN: usize = 10;

/// Canonical table of the seven text questions. Five are mandatory; the
/// leadership question carries the extended "full review" cap.
pub const TEXT_QUESTIONS: [TextQuestion; 7] = [
    TextQuestion {
        new_key: "what_works_well",
        old_key: Some("what_works_well"),
        label: "What Works Well",
        required: true,
        max_len: STANDARD_TEXT_CAP,
    },
    TextQuestion {
        new_key: "what_slowing_down",
        old_key: Some("improvement_areas"),
        label: "What Slowing Down",
        required: true,
        max_len: STANDARD_TEXT_CAP,
    },
    TextQuestion {
        new_key: "leadership_perspective",
        old_key: Some("full_review"),
        label: "Leadership Perspective",
        required: true,
        max_len: FULL_REVIEW_CAP,
    },
    TextQuestion {
        new_key: "team_perspective",
        old_key: None,
        label: "Team Perspective",
        required: false,
        max_len: STANDARD_TEXT_CAP,
    },
    TextQuestion {
        new_key: "one_change_tomorrow",
        old_key: Some("suggestions"),
        label: "One Change Tomorrow",
        required: true,
        max_len: STANDARD_TEXT_CAP,
    },
    TextQuestion {
        new_key: "anything_else",
        old_key: Some("additional_feedback"),
        label: "Anything Else",
        required: true,
        max_len: STANDARD_TEXT_CAP,
    },
    TextQuestion {
        new_key: "recognition",
        old_key: Some("appreciation"),
        label: "Recognition",
        required: false,
        max_len: STANDARD_TEXT_CAP,
    },
];

pub const RECOMMENDATION_TYPE: &str = "custom_recommendation";
pub const RECOMMENDATION_CAP: usize = 2000;

/// A persisted submission with its store-assigned id merged in.
///
/// The wire format distinguishes the two shapes only by a `type` field and
/// by which optional fields happen to be present; here that becomes an
/// explicit sum type so every consumer does one exhaustive match.
#[derive(Clone, Debug)]
pub struct SurveyResponse {
    pub id: String,
    pub timestamp: Option<String>,
    pub body: ResponseBody,
}

#[derive(Clone, Debug)]
pub enum ResponseBody {
    Survey {
        /// Raw pulse map, keyed by whichever scheme the submission used.
        /// Values stay untyped because historical records hold both JSON
        /// numbers and stringified numbers.
        pulse: BTreeMap<String, Value>,
        text: BTreeMap<String, String>,
    },
    Recommendation { recommendation: String },
}

impl SurveyResponse {
    /// Lenient parse of one snapshot record. Returns `None` only when the
    /// record is not a JSON object at all; missing fields degrade to empty
    /// maps so a single odd record never sinks the whole snapshot.
    pub fn from_record(id: &str, record: &Value) -> Option<SurveyResponse> {
        let obj = record.as_object()?;
        let timestamp = obj
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_string);

        let body = if obj.get("type").and_then(Value::as_str) == Some(RECOMMENDATION_TYPE) {
            ResponseBody::Recommendation {
                recommendation: obj
                    .get("recommendation")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }
        } else {
            let pulse = obj
                .get("pulse")
                .and_then(Value::as_object)
                .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            let text = obj
                .get("text")
                .and_then(Value::as_object)
                .map(|m| {
                    m.iter()
                        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                        .collect()
                })
                .unwrap_or_default();
            ResponseBody::Survey { pulse, text }
        };

        Some(SurveyResponse {
            id: id.to_string(),
            timestamp,
            body,
        })
    }

    pub fn is_recommendation(&self) -> bool {
        matches!(self.body, ResponseBody::Recommendation { .. })
    }

    /// Submission time, with missing or unparseable timestamps pinned to the
    /// epoch so date ordering stays total.
    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        self.timestamp
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Rating for one dimension with the key fallback applied.
    pub fn pulse_score(&self, dimension: PulseDimension) -> Option<i64> {
        match &self.body {
            ResponseBody::Survey { pulse, .. } => {
                resolve_pulse(pulse, dimension).and_then(parse_score)
            }
            ResponseBody::Recommendation { .. } => None,
        }
    }

    /// Answer for one text question with the key fallback applied.
    pub fn text_answer(&self, question: &TextQuestion) -> Option<&str> {
        match &self.body {
            ResponseBody::Survey { text, .. } => resolve_text(text, question),
            ResponseBody::Recommendation { .. } => None,
        }
    }
}

/// New-scheme key wins when it carries a usable value; otherwise the legacy
/// key is consulted. Applied per read because one record can mix schemes
/// across dimensions.
pub fn resolve_pulse<'a>(
    pulse: &'a BTreeMap<String, Value>,
    dimension: PulseDimension,
) -> Option<&'a Value> {
    pulse
        .get(dimension.new_key())
        .filter(|v| is_present(v))
        .or_else(|| pulse.get(dimension.old_key()).filter(|v| is_present(v)))
}

pub fn resolve_text<'a>(
    text: &'a BTreeMap<String, String>,
    question: &TextQuestion,
) -> Option<&'a str> {
    text.get(question.new_key)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            question
                .old_key
                .and_then(|key| text.get(key))
                .filter(|s| !s.is_empty())
        })
        .map(String::as_str)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

/// Parse a rating the way old submissions were read: accept JSON numbers and
/// strings with leading integer digits, reject everything else.
pub fn parse_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|n| sign * n)
}

pub fn question_by_key(new_key: &str) -> Option<&'static TextQuestion> {
    TEXT_QUESTIONS.iter().find(|q| q.new_key == new_key)
}

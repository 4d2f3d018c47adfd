use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::domain::models::{
    PulseDimension, MIN_TEXT_LEN, RECOMMENDATION_CAP, RECOMMENDATION_TYPE, TEXT_QUESTIONS,
};
use crate::services::security;

pub const SUBMISSION_VERSION: &str = "1.0";

/// Raw form state as posted by the survey client. Keys use the current
/// naming scheme; anything unrecognized is dropped on validation.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SurveyForm {
    #[serde(default)]
    pub pulse: BTreeMap<String, String>,
    #[serde(default)]
    pub text: BTreeMap<String, String>,
}

/// Field-keyed validation failures. Returned as data, never thrown, so the
/// caller can render one inline message per offending input.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.insert(field.to_string(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A validated, sanitized record ready for the store, plus the anonymous
/// token echoed back to the submitter.
#[derive(Debug)]
pub struct PreparedSubmission {
    pub anonymous_id: String,
    pub record: Value,
}

/// Validate a full survey form: all six pulse dimensions are mandatory, five
/// of the seven text questions are mandatory, and the two optional questions
/// are checked only when answered.
pub fn validate_survey(form: &SurveyForm) -> Result<PreparedSubmission, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut pulse = Map::new();
    let mut text = Map::new();

    for dimension in PulseDimension::ALL {
        let key = dimension.new_key();
        match form.pulse.get(key) {
            Some(raw) if security::validate_pulse_score(raw) => {
                pulse.insert(key.to_string(), Value::String(raw.trim().to_string()));
            }
            _ => errors.push(key, "Please select a rating from 1 to 5"),
        }
    }

    for question in &TEXT_QUESTIONS {
        let raw = form
            .text
            .get(question.new_key)
            .map(String::as_str)
            .unwrap_or_default();
        let answered = !raw.trim().is_empty();

        if !question.required && !answered {
            continue;
        }
        if security::validate_text_response(raw, MIN_TEXT_LEN, question.max_len) {
            text.insert(
                question.new_key.to_string(),
                Value::String(security::sanitize_input(raw, question.max_len)),
            );
        } else {
            errors.push(
                question.new_key,
                format!(
                    "Please provide between {} and {} characters of feedback",
                    MIN_TEXT_LEN, question.max_len
                ),
            );
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let anonymous_id = security::generate_anonymous_id();
    let record = json!({
        "pulse": pulse,
        "text": text,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "anonymousId": anonymous_id,
        "version": SUBMISSION_VERSION,
    });
    Ok(PreparedSubmission { anonymous_id, record })
}

/// Validate the single-field recommendation shape: non-empty after
/// sanitization, capped at 2000 characters.
pub fn validate_recommendation(raw: &str) -> Result<PreparedSubmission, ValidationErrors> {
    let sanitized = security::sanitize_input(raw, RECOMMENDATION_CAP);
    if sanitized.is_empty() {
        let mut errors = ValidationErrors::default();
        errors.push("recommendation", "Please enter a recommendation");
        return Err(errors);
    }

    let anonymous_id = security::generate_anonymous_id();
    let record = json!({
        "type": RECOMMENDATION_TYPE,
        "recommendation": sanitized,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "anonymousId": anonymous_id,
        "version": SUBMISSION_VERSION,
    });
    Ok(PreparedSubmission { anonymous_id, record })
}

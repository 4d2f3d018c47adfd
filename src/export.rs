use crate::domain::models::{PulseDimension, ResponseBody, SurveyResponse, TEXT_QUESTIONS};

/// Fixed CSV layout: identity and type, then the recommendation column, then
/// the six pulse dimensions and the seven text questions. Both record shapes
/// share the one layout with blanks where a column does not apply.
const FIXED_HEADERS: [&str; 4] = ["Response ID", "Type", "Timestamp", "Recommendation"];

pub fn csv_headers() -> Vec<&'static str> {
    let mut headers: Vec<&'static str> = FIXED_HEADERS.to_vec();
    headers.extend(PulseDimension::ALL.iter().map(|d| d.label()));
    headers.extend(TEXT_QUESTIONS.iter().map(|q| q.label));
    headers
}

/// Serialize the whole response set to CSV text. Key resolution reuses the
/// same new-then-old fallback as the dashboard, so both surfaces agree on
/// what a legacy record says.
pub fn to_csv(responses: &[SurveyResponse]) -> String {
    let mut lines = Vec::with_capacity(responses.len() + 1);
    lines.push(
        csv_headers()
            .iter()
            .map(|h| escape_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );

    for response in responses {
        let row = flatten(response);
        lines.push(
            row.iter()
                .map(|field| escape_field(field))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

fn flatten(response: &SurveyResponse) -> Vec<String> {
    let timestamp = response
        .timestamp
        .as_deref()
        .map(|_| response.timestamp_utc().to_rfc3339())
        .unwrap_or_default();

    let mut row = Vec::with_capacity(csv_headers().len());
    row.push(response.id.clone());
    match &response.body {
        ResponseBody::Recommendation { recommendation } => {
            row.push("Custom Recommendation".to_string());
            row.push(timestamp);
            row.push(recommendation.clone());
            for _ in PulseDimension::ALL {
                row.push(String::new());
            }
            for _ in &TEXT_QUESTIONS {
                row.push(String::new());
            }
        }
        ResponseBody::Survey { .. } => {
            row.push("Survey Response".to_string());
            row.push(timestamp);
            row.push(String::new());
            for dimension in PulseDimension::ALL {
                row.push(
                    response
                        .pulse_score(dimension)
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                );
            }
            for question in &TEXT_QUESTIONS {
                row.push(response.text_answer(question).unwrap_or_default().to_string());
            }
        }
    }
    row
}

/// RFC-4180 quoting: wrap when the field holds a comma, quote, or newline,
/// doubling embedded quotes.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_has_seventeen_columns() {
        assert_eq!(csv_headers().len(), 17);
        assert_eq!(csv_headers()[0], "Response ID");
        assert_eq!(csv_headers()[4], "Clarity of Role");
        assert_eq!(csv_headers()[16], "Recognition");
    }

    #[test]
    fn survey_row_leaves_recommendation_blank() {
        let record = json!({
            "pulse": { "wellbeing_at_work": "4", "team_collaboration": "3" },
            "text": { "what_works_well": "standups" },
            "timestamp": "2025-06-01T10:00:00+00:00"
        });
        let response = SurveyResponse::from_record("abc123", &record).unwrap();
        let csv = to_csv(&[response]);
        let row = csv.lines().nth(1).unwrap();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[0], "abc123");
        assert_eq!(fields[1], "Survey Response");
        assert_eq!(fields[3], "");
        // team_collaboration arrives via the legacy key.
        assert_eq!(fields[5], "3");
        assert_eq!(fields[9], "4");
        assert_eq!(fields[10], "standups");
    }

    #[test]
    fn recommendation_row_leaves_survey_columns_blank() {
        let record = json!({
            "type": "custom_recommendation",
            "recommendation": "simple note",
            "timestamp": "2025-06-01T10:00:00+00:00"
        });
        let response = SurveyResponse::from_record("r1", &record).unwrap();
        let csv = to_csv(&[response]);
        let row = csv.lines().nth(1).unwrap();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), 17);
        assert_eq!(fields[1], "Custom Recommendation");
        assert_eq!(fields[3], "simple note");
        assert!(fields[4..].iter().all(|f| f.is_empty()));
    }

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn missing_timestamp_exports_blank() {
        let response = SurveyResponse::from_record("x", &json!({})).unwrap();
        let csv = to_csv(&[response]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row.split(',').nth(2).unwrap(), "");
    }
}

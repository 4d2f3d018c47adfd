use serde::{Deserialize, Serialize};

use crate::domain::models::{PulseDimension, ResponseBody, SurveyResponse};

/// Mean score per pulse dimension, one decimal place, in canonical dimension
/// order. A dimension with no parseable values across the whole set is
/// omitted rather than reported as zero.
pub fn averages_by_dimension(responses: &[SurveyResponse]) -> Vec<DimensionAverage> {
    PulseDimension::ALL
        .iter()
        .filter_map(|&dimension| {
            let values: Vec<i64> = responses
                .iter()
                .filter_map(|r| r.pulse_score(dimension))
                .collect();
            if values.is_empty() {
                return None;
            }
            let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
            Some(DimensionAverage {
                dimension,
                label: dimension.label(),
                average: (mean * 10.0).round() / 10.0,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionAverage {
    pub dimension: PulseDimension,
    pub label: &'static str,
    pub average: f64,
}

/// Distribution of the overall-wellbeing rating over the five integer
/// scores. `buckets[0]` counts score 1. Values outside 1..=5 after parsing
/// are excluded silently; the key fallback is applied per record.
pub fn satisfaction_histogram(responses: &[SurveyResponse]) -> [u32; 5] {
    let mut buckets = [0u32; 5];
    for response in responses {
        if let Some(score @ 1..=5) = response.pulse_score(PulseDimension::OverallWellbeing) {
            buckets[(score - 1) as usize] += 1;
        }
    }
    buckets
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFilter {
    #[default]
    All,
    Surveys,
    Recommendations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Newest,
    Oldest,
    HighestScore,
    LowestScore,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<SortKey> {
        match raw {
            "newest" => Some(SortKey::Newest),
            "oldest" => Some(SortKey::Oldest),
            "highest_score" => Some(SortKey::HighestScore),
            "lowest_score" => Some(SortKey::LowestScore),
            _ => None,
        }
    }
}

/// Dashboard projection query. `sort: None` (an unrecognized sort key) keeps
/// the incoming order untouched.
#[derive(Debug, Clone, Default)]
pub struct ResponseQuery {
    pub type_filter: TypeFilter,
    pub text_only: bool,
    pub search: String,
    pub sort: Option<SortKey>,
}

/// Filter then sort a snapshot. Filters apply in order: type, text
/// presence, substring search. The sort is stable, so insertion order is
/// the tiebreak; missing timestamps rank as the epoch and missing wellbeing
/// scores as zero.
pub fn filter_and_sort(responses: &[SurveyResponse], query: &ResponseQuery) -> Vec<SurveyResponse> {
    let search = query.search.trim().to_lowercase();
    let mut selected: Vec<SurveyResponse> = responses
        .iter()
        .filter(|r| match query.type_filter {
            TypeFilter::All => true,
            TypeFilter::Surveys => !r.is_recommendation(),
            TypeFilter::Recommendations => r.is_recommendation(),
        })
        .filter(|r| !query.text_only || has_text_content(r))
        .filter(|r| search.is_empty() || matches_search(r, &search))
        .cloned()
        .collect();

    match query.sort {
        Some(SortKey::Newest) => {
            selected.sort_by(|a, b| b.timestamp_utc().cmp(&a.timestamp_utc()))
        }
        Some(SortKey::Oldest) => {
            selected.sort_by(|a, b| a.timestamp_utc().cmp(&b.timestamp_utc()))
        }
        Some(SortKey::HighestScore) => selected.sort_by(|a, b| {
            wellbeing_or_zero(b).cmp(&wellbeing_or_zero(a))
        }),
        Some(SortKey::LowestScore) => selected.sort_by(|a, b| {
            wellbeing_or_zero(a).cmp(&wellbeing_or_zero(b))
        }),
        None => {}
    }
    selected
}

/// True when the record carries any non-blank free text: the single
/// `recommendation` field for recommendation records, any text answer
/// otherwise.
pub fn has_text_content(response: &SurveyResponse) -> bool {
    match &response.body {
        ResponseBody::Recommendation { recommendation } => !recommendation.trim().is_empty(),
        ResponseBody::Survey { text, .. } => text.values().any(|t| !t.trim().is_empty()),
    }
}

fn matches_search(response: &SurveyResponse, needle: &str) -> bool {
    match &response.body {
        ResponseBody::Recommendation { recommendation } => {
            recommendation.to_lowercase().contains(needle)
        }
        ResponseBody::Survey { text, .. } => {
            text.values().any(|t| t.to_lowercase().contains(needle))
        }
    }
}

fn wellbeing_or_zero(response: &SurveyResponse) -> i64 {
    response
        .pulse_score(PulseDimension::OverallWellbeing)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SurveyResponse;
    use serde_json::{json, Value};

    fn response(id: &str, record: Value) -> SurveyResponse {
        SurveyResponse::from_record(id, &record).unwrap()
    }

    fn wellbeing(id: &str, score: Value) -> SurveyResponse {
        response(id, json!({ "pulse": { "wellbeing_at_work": score } }))
    }

    #[test]
    fn averages_merge_both_key_schemes() {
        let responses = vec![
            response("a", json!({ "pulse": { "team_collaboration": "3" } })),
            response("b", json!({ "pulse": { "collaboration_team_flow": "5" } })),
        ];
        let averages = averages_by_dimension(&responses);
        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].dimension, PulseDimension::TeamCollaboration);
        assert_eq!(averages[0].average, 4.0);
    }

    #[test]
    fn averages_round_to_one_decimal_and_keep_canonical_order() {
        let responses = vec![
            response("a", json!({ "pulse": { "clarity_of_role": "4", "wellbeing_at_work": "1" } })),
            response("b", json!({ "pulse": { "clarity_of_role": "5", "wellbeing_at_work": "2" } })),
            response("c", json!({ "pulse": { "clarity_of_role": "5" } })),
        ];
        let averages = averages_by_dimension(&responses);
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].dimension, PulseDimension::RoleClarity);
        assert_eq!(averages[0].average, 4.7);
        assert_eq!(averages[1].dimension, PulseDimension::OverallWellbeing);
        assert_eq!(averages[1].average, 1.5);
    }

    #[test]
    fn averages_skip_unparseable_values() {
        let responses = vec![
            response("a", json!({ "pulse": { "wellbeing_at_work": "n/a" } })),
            response("b", json!({ "pulse": {} })),
        ];
        assert!(averages_by_dimension(&responses).is_empty());
    }

    #[test]
    fn histogram_counts_with_fallback_per_record() {
        let responses = vec![
            wellbeing("a", json!("4")),
            response("b", json!({ "pulse": { "overall_wellbeing": "2" } })),
            response("c", json!({ "pulse": {} })),
        ];
        assert_eq!(satisfaction_histogram(&responses), [0, 1, 0, 1, 0]);
    }

    #[test]
    fn histogram_excludes_out_of_range_scores() {
        let responses = vec![
            wellbeing("a", json!("0")),
            wellbeing("b", json!("6")),
            wellbeing("c", json!(5)),
        ];
        assert_eq!(satisfaction_histogram(&responses), [0, 0, 0, 0, 1]);
    }

    #[test]
    fn highest_score_sort_treats_missing_as_zero() {
        let responses = vec![
            wellbeing("a", json!("2")),
            wellbeing("b", json!("5")),
            response("c", json!({ "pulse": {} })),
            wellbeing("d", json!("3")),
        ];
        let query = ResponseQuery {
            sort: Some(SortKey::HighestScore),
            ..Default::default()
        };
        let ids: Vec<String> = filter_and_sort(&responses, &query)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn unknown_sort_keeps_insertion_order() {
        let responses = vec![wellbeing("a", json!("1")), wellbeing("b", json!("5"))];
        let query = ResponseQuery {
            sort: SortKey::parse("by_vibes"),
            ..Default::default()
        };
        let ids: Vec<String> = filter_and_sort(&responses, &query)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn newest_sort_pins_missing_timestamps_to_the_epoch() {
        let responses = vec![
            response("old", json!({ "timestamp": "2025-01-01T00:00:00+00:00" })),
            response("none", json!({})),
            response("new", json!({ "timestamp": "2025-06-01T00:00:00+00:00" })),
        ];
        let query = ResponseQuery {
            sort: Some(SortKey::Newest),
            ..Default::default()
        };
        let ids: Vec<String> = filter_and_sort(&responses, &query)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new", "old", "none"]);
    }

    #[test]
    fn type_filter_splits_shapes() {
        let responses = vec![
            wellbeing("survey", json!("4")),
            response("rec", json!({ "type": "custom_recommendation", "recommendation": "x" })),
        ];
        let surveys = filter_and_sort(
            &responses,
            &ResponseQuery { type_filter: TypeFilter::Surveys, ..Default::default() },
        );
        assert_eq!(surveys.len(), 1);
        assert_eq!(surveys[0].id, "survey");

        let recs = filter_and_sort(
            &responses,
            &ResponseQuery { type_filter: TypeFilter::Recommendations, ..Default::default() },
        );
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, "rec");
    }

    #[test]
    fn text_only_checks_the_recommendation_field_for_recommendations() {
        let empty_rec = response(
            "empty",
            json!({ "type": "custom_recommendation", "recommendation": "" }),
        );
        let full_rec = response(
            "full",
            json!({ "type": "custom_recommendation", "recommendation": "hire faster" }),
        );
        let silent_survey = response("silent", json!({ "pulse": { "wellbeing_at_work": "4" } }));

        assert!(!has_text_content(&empty_rec));
        assert!(has_text_content(&full_rec));
        assert!(!has_text_content(&silent_survey));

        let query = ResponseQuery { text_only: true, ..Default::default() };
        let kept = filter_and_sort(&[empty_rec, full_rec, silent_survey], &query);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "full");
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let responses = vec![
            response("a", json!({ "text": { "what_works_well": "Weekly DEMOS are great" } })),
            response("b", json!({ "text": { "anything_else": "nothing to add" } })),
            response("c", json!({ "type": "custom_recommendation", "recommendation": "more demos please" })),
        ];
        let query = ResponseQuery { search: "demos".to_string(), ..Default::default() };
        let ids: Vec<String> = filter_and_sort(&responses, &query)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}

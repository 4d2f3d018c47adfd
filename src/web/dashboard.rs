use crate::analytics::aggregate::{
    self, DimensionAverage, ResponseQuery, SortKey, TypeFilter,
};
use crate::domain::models::{
    PulseDimension, ResponseBody, SurveyResponse, TEXT_QUESTIONS,
};
use crate::export;
use crate::state::SharedState;
use crate::web::session::AdminSession;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Serialize)]
pub struct DashboardSummary {
    pub total_responses: usize,
    pub recommendations: usize,
    pub this_week: usize,
    pub average_overall: f64,
    pub averages: Vec<DimensionAverage>,
    /// Counts for scores 1 through 5.
    pub satisfaction_histogram: [u32; 5],
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsesParams {
    #[serde(rename = "type")]
    pub type_filter: Option<String>,
    #[serde(default)]
    pub text_only: bool,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// One record flattened for the dashboard list, with the key fallback
/// already applied so the client never sees the legacy scheme.
#[derive(Serialize)]
pub struct ResponseView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pulse: BTreeMap<&'static str, i64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub text: BTreeMap<&'static str, String>,
    pub has_text: bool,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/summary", get(summary))
        .route("/responses", get(responses))
        .route("/export", get(export_csv))
        .with_state(state)
}

async fn current_responses(state: &SharedState) -> Result<Vec<SurveyResponse>, StatusCode> {
    if let Some(err) = state.feed_error.read().await.as_deref() {
        tracing::error!("dashboard unavailable, store feed down: {}", err);
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(state.responses.read().await.clone())
}

async fn summary(
    AdminSession(_claims): AdminSession,
    State(state): State<SharedState>,
) -> Result<Json<DashboardSummary>, StatusCode> {
    let responses = current_responses(&state).await?;

    let averages = aggregate::averages_by_dimension(&responses);
    let average_overall = averages
        .iter()
        .find(|a| a.dimension == PulseDimension::OverallWellbeing)
        .map(|a| a.average)
        .unwrap_or(0.0);
    let week_ago = Utc::now() - Duration::days(7);

    Ok(Json(DashboardSummary {
        total_responses: responses.len(),
        recommendations: responses.iter().filter(|r| r.is_recommendation()).count(),
        this_week: responses
            .iter()
            .filter(|r| r.timestamp.is_some() && r.timestamp_utc() > week_ago)
            .count(),
        average_overall,
        satisfaction_histogram: aggregate::satisfaction_histogram(&responses),
        averages,
    }))
}

async fn responses(
    AdminSession(_claims): AdminSession,
    State(state): State<SharedState>,
    Query(params): Query<ResponsesParams>,
) -> Result<Json<Vec<ResponseView>>, StatusCode> {
    let responses = current_responses(&state).await?;
    let query = to_query(&params);
    let views = aggregate::filter_and_sort(&responses, &query)
        .iter()
        .map(to_view)
        .collect();
    Ok(Json(views))
}

async fn export_csv(
    AdminSession(_claims): AdminSession,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, StatusCode> {
    let responses = current_responses(&state).await?;
    let body = export::to_csv(&responses);
    let filename = format!(
        "whisper-feedback-{}.csv",
        Utc::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

fn to_query(params: &ResponsesParams) -> ResponseQuery {
    let type_filter = match params.type_filter.as_deref() {
        Some("surveys") => TypeFilter::Surveys,
        Some("recommendations") => TypeFilter::Recommendations,
        _ => TypeFilter::All,
    };
    ResponseQuery {
        type_filter,
        text_only: params.text_only,
        search: params.search.clone().unwrap_or_default(),
        sort: params.sort.as_deref().and_then(SortKey::parse),
    }
}

fn to_view(response: &SurveyResponse) -> ResponseView {
    let mut view = ResponseView {
        id: response.id.clone(),
        kind: if response.is_recommendation() {
            "custom_recommendation"
        } else {
            "survey"
        },
        timestamp: response.timestamp.clone(),
        recommendation: None,
        pulse: BTreeMap::new(),
        text: BTreeMap::new(),
        has_text: aggregate::has_text_content(response),
    };

    match &response.body {
        ResponseBody::Recommendation { recommendation } => {
            view.recommendation = Some(recommendation.clone());
        }
        ResponseBody::Survey { .. } => {
            for dimension in PulseDimension::ALL {
                if let Some(score) = response.pulse_score(dimension) {
                    view.pulse.insert(dimension.new_key(), score);
                }
            }
            for question in &TEXT_QUESTIONS {
                if let Some(answer) = response.text_answer(question) {
                    view.text.insert(question.new_key, answer.to_string());
                }
            }
        }
    }
    view
}

/// Keep the cached snapshot in sync with the store. This task is the only
/// writer of `state.responses`; each callback replaces the whole set, so a
/// late or repeated snapshot is harmless.
pub async fn run_snapshot_listener(state: SharedState) {
    let mut subscription = state.store.subscribe(crate::store::SUBMISSIONS_COLLECTION).await;
    loop {
        let snapshot = subscription.current();
        let parsed = parse_snapshot(&snapshot);
        tracing::debug!("snapshot applied: {} responses", parsed.len());
        *state.responses.write().await = parsed;
        *state.feed_error.write().await = None;

        if let Err(err) = subscription.changed().await {
            tracing::error!("submissions subscription lost: {}", err);
            *state.feed_error.write().await = Some(err.to_string());
            return;
        }
    }
}

fn parse_snapshot(snapshot: &BTreeMap<String, Value>) -> Vec<SurveyResponse> {
    snapshot
        .iter()
        .filter_map(|(id, record)| {
            let parsed = SurveyResponse::from_record(id, record);
            if parsed.is_none() {
                tracing::warn!("skipping malformed record {}", id);
            }
            parsed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_query_values_fall_back_to_defaults() {
        let query = to_query(&ResponsesParams {
            type_filter: Some("everything".to_string()),
            text_only: false,
            search: None,
            sort: Some("by_vibes".to_string()),
        });
        assert_eq!(query.type_filter, TypeFilter::All);
        assert!(query.sort.is_none());
        assert!(query.search.is_empty());
    }

    #[test]
    fn snapshot_parsing_skips_malformed_records() {
        let mut snapshot = BTreeMap::new();
        snapshot.insert("good".to_string(), json!({ "pulse": { "wellbeing_at_work": "4" } }));
        snapshot.insert("bad".to_string(), json!(42));
        let parsed = parse_snapshot(&snapshot);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "good");
    }

    #[test]
    fn view_resolves_legacy_keys_to_current_scheme() {
        let record = json!({
            "pulse": { "team_collaboration": "3" },
            "text": { "appreciation": "great mentoring" }
        });
        let response = SurveyResponse::from_record("r1", &record).unwrap();
        let view = to_view(&response);
        assert_eq!(view.pulse.get("collaboration_team_flow"), Some(&3));
        assert_eq!(
            view.text.get("recognition").map(String::as_str),
            Some("great mentoring")
        );
        assert!(view.has_text);
    }
}

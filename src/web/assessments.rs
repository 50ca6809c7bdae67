use crate::db;
use crate::domain::scoring::{score, AnswerSet, RiskLevel};
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(history))
        .route("/complete", post(complete))
        .route("/round1", post(round_gone))
        .route("/round2", post(round_gone))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub round1_answers: Option<AnswerSet>,
    #[serde(default)]
    pub round2_answers: Option<AnswerSet>,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub success: bool,
    pub total_score: i32,
    pub round1_score: i32,
    pub round2_score: i32,
    pub risk_level: RiskLevel,
    pub assessment_id: Uuid,
}

#[derive(Serialize)]
pub struct AssessmentErrorResponse {
    pub error: String,
}

async fn history(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<db::Assessment>>, StatusCode> {
    let assessments = db::list_assessments(&state.pool, user_id)
        .await
        .map_err(|e| {
            tracing::error!("Assessment history lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(assessments))
}

/// Score both rounds and persist the result as one complete assessment.
async fn complete(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, (StatusCode, Json<AssessmentErrorResponse>)> {
    let result = score(
        &state.rules,
        payload.round1_answers.as_ref(),
        payload.round2_answers.as_ref(),
    )
    .map_err(|e| {
        tracing::warn!("Rejected assessment from {}: {}", user_id, e);
        (
            StatusCode::BAD_REQUEST,
            Json(AssessmentErrorResponse {
                error: "Missing round1_answers or round2_answers".to_string(),
            }),
        )
    })?;

    let answers = json!({
        "round1_answers": payload.round1_answers,
        "round2_answers": payload.round2_answers,
    });

    let assessment_id = db::insert_assessment(&state.pool, user_id, &answers, &result)
        .await
        .map_err(|e| {
            tracing::error!("Assessment insert failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AssessmentErrorResponse {
                    error: "Failed to save assessment".to_string(),
                }),
            )
        })?;

    tracing::info!(
        "Saved assessment {} for {}: {}/100 ({})",
        assessment_id,
        user_id,
        result.total_score,
        result.risk_level.as_str()
    );

    Ok(Json(CompleteResponse {
        success: true,
        total_score: result.total_score,
        round1_score: result.round1_score,
        round2_score: result.round2_score,
        risk_level: result.risk_level,
        assessment_id,
    }))
}

/// The single-round endpoints are permanently retired; answering before
/// auth is fine since they serve no data.
async fn round_gone() -> (StatusCode, Json<AssessmentErrorResponse>) {
    (
        StatusCode::GONE,
        Json(AssessmentErrorResponse {
            error: "Use /api/assessments/complete with round1_answers + round2_answers"
                .to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scoring::ScoringRules;
    use crate::middleware::RateLimiter;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::Request;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        // Lazy pool: never connects unless a query runs.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/neurozen_test")
            .unwrap();
        Arc::new(AppState {
            pool,
            session_key: b"test-session-key-test-session-ke".to_vec(),
            login_limiter: RateLimiter::new(5, 60),
            rules: ScoringRules::fixed(),
        })
    }

    #[tokio::test]
    async fn legacy_round_endpoints_are_gone() {
        for path in ["/round1", "/round2"] {
            let response = router(test_state())
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri(path)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::GONE);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert!(parsed["error"]
                .as_str()
                .unwrap()
                .contains("/api/assessments/complete"));
        }
    }

    #[tokio::test]
    async fn complete_rejects_unauthenticated_requests() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/complete")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"round1_answers":{},"round2_answers":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn complete_request_tolerates_absent_fields() {
        let payload: CompleteRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(payload.round1_answers.is_none());
        assert!(payload.round2_answers.is_none());

        let payload: CompleteRequest =
            serde_json::from_str(r#"{"round1_answers":{"q1":4},"round2_answers":{"q1":"Mild"}}"#)
                .unwrap();
        assert_eq!(payload.round1_answers.unwrap().len(), 1);
        assert_eq!(payload.round2_answers.unwrap().len(), 1);
    }
}

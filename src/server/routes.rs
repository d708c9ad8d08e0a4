//! Axum route handlers for the eqcoach HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`                  — Returns `{"status": "ok", "version": "0.4.0"}`
//! - `POST /sessions`                — Start a session; empty body or `SessionConfig`
//! - `GET  /sessions/:id`            — Full persisted session state
//! - `POST /sessions/:id/turns`      — `{utterance}`: run one dialogue turn
//! - `POST /sessions/:id/replies`    — `{candidate}`: gate a coach reply
//! - `GET  /sessions/:id/transcript` — Ordered transcript
//! - `POST /score`                   — `{text, directives}`: score only

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::SessionConfig;
use crate::dialogue::{build_transcript, Phase, SessionState, Transcript};
use crate::emotion::EmotionalState;
use crate::engine::CoachingEngine;
use crate::errors::{CatalogIntegrityError, SessionError};
use crate::quality::{CorrectionOutcome, CorrectionResult, ScoreReport};
use crate::tone::StyleDirectives;

type ApiError = (StatusCode, Json<Value>);

/// Shared application state for the HTTP server.
///
/// Each session sits behind its own async mutex: turns within a session run
/// strictly one at a time, different sessions run concurrently.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CoachingEngine>,
    pub sessions: Arc<DashMap<String, Arc<Mutex<SessionState>>>>,
}

impl AppState {
    pub fn new(engine: CoachingEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            sessions: Arc::new(DashMap::new()),
        }
    }

    fn session(&self, id: &str) -> Result<Arc<Mutex<SessionState>>, ApiError> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                error(
                    StatusCode::NOT_FOUND,
                    format!("Session '{id}' not found"),
                )
            })
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sessions", post(create_session_handler))
        .route("/sessions/:id", get(get_session_handler))
        .route("/sessions/:id/turns", post(turn_handler))
        .route("/sessions/:id/replies", post(reply_handler))
        .route("/sessions/:id/transcript", get(transcript_handler))
        .route("/score", post(score_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

fn session_error(err: SessionError) -> ApiError {
    let status = match &err {
        SessionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::CatalogIntegrity(_) | SessionError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error(status, err.to_string())
}

fn catalog_error(err: CatalogIntegrityError) -> ApiError {
    session_error(err.into())
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub utterance: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub candidate: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub text: String,
    #[serde(default)]
    pub directives: StyleDirectives,
}

/// Where a session stands and what the coach should do next.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub step: String,
    pub phase: Phase,
    pub turn_count: u32,
    pub complete: bool,
    pub prompt: String,
    pub directives: StyleDirectives,
    pub emotional: EmotionalState,
}

impl SessionView {
    fn build(engine: &CoachingEngine, state: &SessionState) -> Result<Self, ApiError> {
        let prompt = engine.current_prompt(state).map_err(catalog_error)?;
        Ok(Self {
            session_id: state.session_id().to_string(),
            step: state.step_id.clone(),
            phase: state.phase,
            turn_count: state.turn_count,
            complete: engine.is_complete(state),
            prompt,
            directives: state.tone.directives,
            emotional: state.emotional.clone(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    /// Whether the reply was accepted and appended to the session history.
    pub delivered: bool,
    pub result: CorrectionResult,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health — liveness check.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "eqcoach",
    }))
}

/// POST /sessions — start a session.
///
/// An empty body starts a session with the default config. A body that is
/// present must be a valid `SessionConfig`.
async fn create_session_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let config: SessionConfig = if body.iter().all(u8::is_ascii_whitespace) {
        SessionConfig::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("invalid session config: {err}"),
            )
        })?
    };

    let session = state
        .engine
        .init_session(&config)
        .map_err(|err| session_error(err.into()))?;
    let view = SessionView::build(&state.engine, &session)?;

    match state.sessions.entry(view.session_id.clone()) {
        Entry::Occupied(_) => {
            return Err(error(
                StatusCode::CONFLICT,
                format!("Session '{}' already exists", view.session_id),
            ));
        }
        Entry::Vacant(slot) => {
            slot.insert(Arc::new(Mutex::new(session)));
        }
    }
    log::info!("[Server] session {} created", view.session_id);

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /sessions/:id — the full session state, as persisted.
async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionState>, ApiError> {
    let session = state.session(&id)?;
    let guard = session.lock().await;
    Ok(Json(guard.clone()))
}

/// POST /sessions/:id/turns — run one dialogue turn.
///
/// The stored state is replaced only when the turn succeeds.
async fn turn_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<SessionView>, ApiError> {
    if request.utterance.trim().is_empty() {
        return Err(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "utterance must not be empty",
        ));
    }

    let session = state.session(&id)?;
    let mut guard = session.lock().await;

    let next = state
        .engine
        .run_turn(&request.utterance, &guard)
        .await
        .map_err(session_error)?;
    let view = SessionView::build(&state.engine, &next)?;
    *guard = next;

    Ok(Json(view))
}

/// POST /sessions/:id/replies — gate a candidate coach reply against the
/// session's current directives. Accepted replies are appended to history.
async fn reply_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let session = state.session(&id)?;
    let mut guard = session.lock().await;

    let directives = guard.tone.directives;
    let result = state
        .engine
        .score_and_correct(&request.candidate, &directives)
        .await;

    let delivered = result.outcome == CorrectionOutcome::Accepted;
    if delivered {
        guard.add_assistant_message(result.final_text.clone());
    } else {
        log::warn!(
            "[Server] session {id}: reply escalated at {:.1}/100",
            result.final_score.overall
        );
    }

    Ok(Json(ReplyResponse { delivered, result }))
}

/// GET /sessions/:id/transcript
async fn transcript_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transcript>, ApiError> {
    let session = state.session(&id)?;
    let guard = session.lock().await;
    Ok(Json(build_transcript(&guard, None, None)))
}

/// POST /score — score a text against explicit directives.
async fn score_handler(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Json<ScoreReport> {
    Json(state.engine.score(&request.text, &request.directives))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::quality::fixtures::{supportive, SUPPORTIVE_REPLY};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    fn state() -> AppState {
        AppState::new(CoachingEngine::standalone(EngineConfig::default()).unwrap())
    }

    fn app() -> Router {
        app_router(state())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, json) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::VERSION);
        assert_eq!(json["service"], "eqcoach");
    }

    #[tokio::test]
    async fn test_create_session_without_body() {
        let (status, json) = send(&app(), "POST", "/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["step"], "warmup_intro");
        assert_eq!(json["phase"], "warmup");
        assert_eq!(json["complete"], false);
        assert!(json["prompt"].as_str().unwrap().contains("Tone guidance"));
    }

    #[tokio::test]
    async fn test_create_session_rejects_unknown_start_step() {
        let (status, json) = send(
            &app(),
            "POST",
            "/sessions",
            Some(serde_json::json!({"start_step": "warmup_karaoke"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("warmup_karaoke"));
    }

    #[tokio::test]
    async fn test_duplicate_session_id_conflicts() {
        let app = app();
        let body = serde_json::json!({"session_id": "dup"});
        let (status, _) = send(&app, "POST", "/sessions", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, "POST", "/sessions", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_malformed_session_config_is_rejected() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/sessions")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"session_id": "s-bad", "#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let request = Request::builder()
            .method("POST")
            .uri("/sessions")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"initial_emotional": "calm"}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, "GET", "/sessions/s-bad", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_concurrent_creates_with_same_id_keep_first() {
        let app_state = state();
        let app = app_router(app_state.clone());
        let body = serde_json::json!({"session_id": "race", "student_id": "stu-1"});

        let (first, second) = tokio::join!(
            send(&app, "POST", "/sessions", Some(body.clone())),
            send(&app, "POST", "/sessions", Some(body.clone())),
        );
        let mut statuses = vec![first.0, second.0];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
        assert_eq!(app_state.sessions.len(), 1);

        // A later duplicate must not replace the stored session.
        send(
            &app,
            "POST",
            "/sessions/race/turns",
            Some(serde_json::json!({"utterance": "hi there"})),
        )
        .await;
        let (status, _) = send(&app, "POST", "/sessions", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (_, stored) = send(&app, "GET", "/sessions/race", None).await;
        assert_eq!(stored["turn_count"], 1);
    }

    #[tokio::test]
    async fn test_turn_advances_session() {
        let app = app();
        let (_, created) = send(
            &app,
            "POST",
            "/sessions",
            Some(serde_json::json!({"session_id": "s-1", "student_id": "stu-1"})),
        )
        .await;
        assert_eq!(created["session_id"], "s-1");

        let (status, json) = send(
            &app,
            "POST",
            "/sessions/s-1/turns",
            Some(serde_json::json!({"utterance": "I'm frustrated and nervous about all this"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["step"], "warmup_background");
        assert_eq!(json["turn_count"], 1);
        assert_eq!(json["emotional"]["frustration"], 1);

        let (status, stored) = send(&app, "GET", "/sessions/s-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["step_id"], "warmup_background");
        assert_eq!(stored["history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_utterance_rejected() {
        let app = app();
        send(&app, "POST", "/sessions", Some(serde_json::json!({"session_id": "s-2"}))).await;
        let (status, _) = send(
            &app,
            "POST",
            "/sessions/s-2/turns",
            Some(serde_json::json!({"utterance": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = app();
        let (status, _) = send(&app, "GET", "/sessions/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            &app,
            "POST",
            "/sessions/missing/turns",
            Some(serde_json::json!({"utterance": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/sessions/missing/transcript", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reply_is_delivered_and_transcribed() {
        let app_state = state();
        let app = app_router(app_state.clone());
        send(&app, "POST", "/sessions", Some(serde_json::json!({"session_id": "s-3"}))).await;

        // Pin the session's directives so the fixture reply is on target.
        {
            let session = app_state.session("s-3").unwrap();
            session.lock().await.tone.directives = supportive();
        }

        let (status, json) = send(
            &app,
            "POST",
            "/sessions/s-3/replies",
            Some(serde_json::json!({"candidate": SUPPORTIVE_REPLY})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["delivered"], true);
        assert_eq!(json["result"]["outcome"], "accepted");
        assert_eq!(json["result"]["attempts"], 0);

        let (status, transcript) = send(&app, "GET", "/sessions/s-3/transcript", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transcript["session_id"], "s-3");
        assert_eq!(transcript["entries"][0]["speaker"], "coach");
        assert_eq!(transcript["metadata"]["coach_turns"], 1);
    }

    #[tokio::test]
    async fn test_off_target_reply_is_not_delivered() {
        let app_state = state();
        let app = app_router(app_state.clone());
        send(&app, "POST", "/sessions", Some(serde_json::json!({"session_id": "s-4"}))).await;
        {
            let session = app_state.session("s-4").unwrap();
            session.lock().await.tone.directives = supportive();
        }

        let (status, json) = send(
            &app,
            "POST",
            "/sessions/s-4/replies",
            Some(serde_json::json!({
                "candidate": "Let's be honest. Reality check. Here is your plan."
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["delivered"], false);
        assert_eq!(json["result"]["outcome"], "escalated");

        let session = app_state.session("s-4").unwrap();
        assert!(session.lock().await.history.is_empty());
    }

    #[tokio::test]
    async fn test_score_endpoint() {
        let directives = serde_json::to_value(supportive()).unwrap();
        let (status, json) = send(
            &app(),
            "POST",
            "/score",
            Some(serde_json::json!({"text": SUPPORTIVE_REPLY, "directives": directives})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["is_passing"], true);
        assert_eq!(json["scores"].as_array().unwrap().len(), 7);
    }
}

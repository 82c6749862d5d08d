//! Surface HTTP du moteur.

use std::sync::atomic::Ordering;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use loto90_db::models::Stream;
use loto90_engine::error::EngineError;
use loto90_engine::evaluate::evaluate_grid;
use loto90_engine::history::PredictionRecord;
use loto90_engine::predict::{day_filtered, log_prediction, predict, Prediction, PredictionRequest};

use crate::refresh;
use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/predict", get(predict_handler))
        .route("/evaluate", post(evaluate_handler))
        .route("/api/brain", get(brain_handler))
        .route("/refresh", post(refresh_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match e {
            EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EngineError::StateConflict(_) => StatusCode::CONFLICT,
            EngineError::Unavailable(_) | EngineError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}", self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct PredictQuery {
    #[serde(rename = "type")]
    draw_type_id: Option<i64>,
    day: Option<u8>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictResponse {
    #[serde(flatten)]
    prediction: Prediction,
    cached: bool,
    cache_age_seconds: u64,
}

async fn predict_handler(
    State(state): State<SharedState>,
    Query(query): Query<PredictQuery>,
) -> Result<Json<PredictResponse>, ApiError> {
    if let Some(day) = query.day {
        if day > 6 {
            return Err(ApiError::invalid(format!("jour invalide : {day}")));
        }
    }

    let key = (query.draw_type_id, query.day);
    if let Some((prediction, age)) = state.prediction_cache.get(&key) {
        return Ok(Json(PredictResponse {
            prediction,
            cached: true,
            cache_age_seconds: age,
        }));
    }

    let draws = state.store.get_draws(query.draw_type_id);
    let now = chrono::Utc::now().naive_utc();

    // Vérification paresseuse (limitée à une par minute), puis
    // apprentissage des tirages pas encore vus, avant le scoring.
    state
        .verifier
        .run(state.log.as_ref(), &draws, now, false);
    if let Some(latest) = draws.last() {
        for stream in [Stream::Winning, Stream::Machine] {
            state.brains.learn_if_new(
                stream,
                latest,
                &draws,
                query.draw_type_id,
                &state.strategies,
                state.store.as_ref(),
                now,
            );
        }
    }

    let winning = state.brains.snapshot(Stream::Winning);
    let machine = state.brains.snapshot(Stream::Machine);
    let prediction = predict(
        &PredictionRequest {
            draws: &draws,
            draw_type_id: query.draw_type_id,
            day_of_week: query.day,
            winning_weights: &winning.weights,
            machine_weights: &machine.weights,
            strategies: &state.strategies,
            now,
        },
        Some(state.log.as_ref()),
    );
    log_prediction(&prediction, state.log.as_ref());
    state.prediction_cache.put(key, prediction.clone());

    Ok(Json(PredictResponse {
        prediction,
        cached: false,
        cache_age_seconds: 0,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateBody {
    numbers: Vec<u8>,
    draw_type_id: Option<i64>,
    day_of_week: Option<u8>,
}

async fn evaluate_handler(
    State(state): State<SharedState>,
    Json(body): Json<EvaluateBody>,
) -> Result<Response, ApiError> {
    let draws = state.store.get_draws(body.draw_type_id);
    let (working, _) = day_filtered(&draws, body.day_of_week);
    let brain = state.brains.snapshot(Stream::Winning);
    let evaluation = evaluate_grid(&body.numbers, &working, &brain.weights, &state.strategies)?;
    Ok(Json(evaluation).into_response())
}

#[derive(Deserialize)]
pub struct BrainQuery {
    stream: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RealPerformance {
    verified_count: usize,
    total_matches: u64,
    avg_matches: f64,
    best_match: u8,
}

async fn brain_handler(
    State(state): State<SharedState>,
    Query(query): Query<BrainQuery>,
) -> Result<Response, ApiError> {
    let stream = match query.stream.as_deref() {
        None | Some("winning") => Stream::Winning,
        Some("machine") => Stream::Machine,
        Some(other) => return Err(ApiError::invalid(format!("volet inconnu : {other}"))),
    };

    let draws = state.store.get_draws(None);
    let now = chrono::Utc::now().naive_utc();
    state
        .verifier
        .run(state.log.as_ref(), &draws, now, false);

    let brain = state.brains.snapshot(stream);
    let status = serde_json::from_str::<serde_json::Value>(&brain.to_json()?)
        .map_err(|e| ApiError::from(EngineError::Internal(e.to_string())))?;

    let entries = state.log.entries();
    let real_performance = real_performance(&entries);

    Ok(Json(json!({
        "stream": stream.key(),
        "brain": status,
        "realPerformance": real_performance,
        "isRefreshing": state.is_refreshing.load(Ordering::SeqCst),
        "lastError": state.last_error(),
    }))
    .into_response())
}

fn real_performance(entries: &[PredictionRecord]) -> RealPerformance {
    let verified: Vec<_> = entries.iter().filter_map(|e| e.result.as_ref()).collect();
    let total_matches: u64 = verified.iter().map(|r| r.match_count as u64).sum();
    RealPerformance {
        verified_count: verified.len(),
        total_matches,
        avg_matches: if verified.is_empty() {
            0.0
        } else {
            total_matches as f64 / verified.len() as f64
        },
        best_match: verified.iter().map(|r| r.match_count).max().unwrap_or(0),
    }
}

#[derive(Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    force_train: bool,
}

async fn refresh_handler(
    State(state): State<SharedState>,
    Query(query): Query<RefreshQuery>,
) -> Json<serde_json::Value> {
    if state.is_refreshing.load(Ordering::SeqCst) {
        return Json(json!({
            "success": false,
            "message": "Un rafraîchissement est déjà en cours",
        }));
    }
    let state = state.clone();
    let force_train = query.force_train;
    tokio::spawn(async move {
        refresh::run_refresh(state, force_train).await;
    });
    Json(json!({
        "success": true,
        "message": "Rafraîchissement lancé en arrière-plan",
    }))
}

async fn health_handler() -> &'static str {
    "ok"
}

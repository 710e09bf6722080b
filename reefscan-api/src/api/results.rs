//! `/api/results`: submit an image for analysis, list recorded results

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use reefscan_common::api::{AnalysisResult, ResultCreatedResponse};

use super::intake::ImageUpload;
use crate::error::ApiResult;
use crate::AppState;

pub const CREATED_MESSAGE: &str = "Result processed successfully";

/// POST /api/results
///
/// Runs the full analysis for one image. `201` with the recorded result;
/// `400` when no image was supplied (nothing is recorded).
pub async fn create_result(
    State(state): State<AppState>,
    ImageUpload(image): ImageUpload,
) -> ApiResult<(StatusCode, Json<ResultCreatedResponse>)> {
    let data = state.analysis.analyze(image).await?;

    Ok((
        StatusCode::CREATED,
        Json(ResultCreatedResponse {
            message: CREATED_MESSAGE.to_string(),
            data,
        }),
    ))
}

/// GET /api/results
///
/// Every recorded result in record order. No pagination.
pub async fn list_results(State(state): State<AppState>) -> ApiResult<Json<Vec<AnalysisResult>>> {
    Ok(Json(state.analysis.list_results().await?))
}

/// Build result routes
pub fn results_routes() -> Router<AppState> {
    Router::new().route("/api/results", get(list_results).post(create_result))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use super::sheets::find_dataset;
use crate::{
    error::AppError,
    models::ChartDataResponse,
    services::{file_processor, store::ChartConfig},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/charts/:id", get(get_chart).delete(delete_chart))
        .route("/charts/:id/data", get(chart_data))
}

async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChartConfig>, AppError> {
    Ok(Json(find_chart(&state, id)?))
}

async fn chart_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChartDataResponse>, AppError> {
    let chart = find_chart(&state, id)?;
    let dataset = find_dataset(&state, chart.dataset_id)?;
    let series = file_processor::render_chart(dataset, chart.query.clone()).await?;
    Ok(Json(ChartDataResponse { chart, series }))
}

async fn delete_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.charts.delete(id) {
        tracing::info!("Deleted chart {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Chart {} does not exist", id)))
    }
}

fn find_chart(state: &AppState, id: Uuid) -> Result<ChartConfig, AppError> {
    state
        .charts
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Chart {} does not exist", id)))
}

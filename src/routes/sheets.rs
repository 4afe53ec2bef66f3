use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, SheetError},
    models::{DatasetSummary, ImportRequest, SaveChartRequest, UploadQuery},
    services::{
        excel::{ChartQuery, ChartSeries, IngestResult, SheetFormat},
        file_processor::{self, IngestLimits},
        store::{ChartConfig, StoredDataset},
    },
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sheets", post(upload_sheet))
        .route("/sheets/import", post(import_sheet))
        .route("/sheets/:id", get(get_sheet))
        .route("/sheets/:id/preview", post(preview_chart))
        .route("/sheets/:id/charts", post(save_chart).get(list_charts))
}

async fn upload_sheet(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<DatasetSummary>), AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let hint = upload_hint(query.filename.as_deref(), content_type.as_deref());
    tracing::info!("Received upload of {}KB (hint: {:?})", body.len() / 1024, hint);

    let data = file_processor::ingest_upload(body, hint, IngestLimits::from(&state.config)).await?;
    let summary = store_dataset(&state, query.filename, data);
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn import_sheet(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImportRequest>,
) -> Result<(StatusCode, Json<DatasetSummary>), AppError> {
    let start = std::time::Instant::now();
    if request.signed_url.trim().is_empty() {
        return Err(AppError::InvalidInput("No file URL provided".to_string()));
    }
    tracing::info!(
        "Importing file type: {}, URL length: {}",
        request.file_type,
        request.signed_url.len()
    );

    let file_data = file_processor::load_file_from_url(&request.signed_url).await?;
    tracing::info!("File downloaded, size: {}KB, took: {:?}", file_data.len() / 1024, start.elapsed());

    let data = file_processor::ingest_upload(
        file_data,
        Some(request.file_type),
        IngestLimits::from(&state.config),
    )
    .await?;
    let summary = store_dataset(&state, None, data);
    tracing::info!("Import completed in {:?}", start.elapsed());
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn get_sheet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DatasetSummary>, AppError> {
    let dataset = find_dataset(&state, id)?;
    Ok(Json(DatasetSummary::from(dataset.as_ref())))
}

async fn preview_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(query): Json<ChartQuery>,
) -> Result<Json<Option<ChartSeries>>, AppError> {
    let dataset = find_dataset(&state, id)?;
    let series = file_processor::render_chart(dataset, query).await?;
    Ok(Json(series))
}

async fn save_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SaveChartRequest>,
) -> Result<(StatusCode, Json<ChartConfig>), AppError> {
    let dataset = find_dataset(&state, id)?;
    for column in [&request.query.category_column, &request.query.value_column] {
        if !dataset.data.columns.contains(column) {
            return Err(SheetError::InvalidColumn(column.clone()).into());
        }
    }

    let title = request
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| {
            format!("{} by {}", request.query.value_column, request.query.category_column)
        });
    let config = ChartConfig {
        id: Uuid::new_v4(),
        dataset_id: id,
        title,
        query: request.query,
        created_at: Utc::now(),
    };
    state.charts.save(config.clone());
    tracing::info!("Saved chart {} for dataset {}", config.id, id);
    Ok((StatusCode::CREATED, Json(config)))
}

async fn list_charts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChartConfig>>, AppError> {
    find_dataset(&state, id)?;
    Ok(Json(state.charts.list_for_dataset(id)))
}

/// The first of the file name and content type that names a known format,
/// falling back to whichever one was sent.
fn upload_hint(filename: Option<&str>, content_type: Option<&str>) -> Option<String> {
    [filename, content_type]
        .into_iter()
        .flatten()
        .find(|hint| SheetFormat::from_hint(hint).is_some())
        .or(filename.or(content_type))
        .map(str::to_string)
}

fn store_dataset(state: &AppState, file_name: Option<String>, data: IngestResult) -> DatasetSummary {
    let dataset = Arc::new(StoredDataset {
        id: Uuid::new_v4(),
        file_name,
        created_at: Utc::now(),
        data,
    });
    let summary = DatasetSummary::from(dataset.as_ref());
    tracing::info!(
        "Stored dataset {}: {} rows, {} columns",
        dataset.id,
        dataset.data.row_count,
        dataset.data.columns.len()
    );
    state.datasets.insert(dataset);
    summary
}

pub(crate) fn find_dataset(state: &AppState, id: Uuid) -> Result<Arc<StoredDataset>, AppError> {
    state
        .datasets
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Dataset {} does not exist", id)))
}

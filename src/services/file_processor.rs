use bytes::Bytes;
use reqwest::Client;
use std::sync::Arc;

use crate::error::{AppError, SheetError};
use crate::services::excel::{self, ChartQuery, ChartSeries, IngestResult, Row};
use crate::services::store::StoredDataset;

/// Caller-side guards applied before and after decoding an upload.
#[derive(Debug, Clone, Copy)]
pub struct IngestLimits {
    pub max_file_size: usize,
    pub max_rows: usize,
}

impl From<&crate::config::Config> for IngestLimits {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            max_file_size: config.max_file_size,
            max_rows: config.max_rows,
        }
    }
}

/// Parses the first sheet and classifies its columns.
pub fn ingest(file_data: &[u8], hint: Option<&str>) -> Result<IngestResult, SheetError> {
    let start = std::time::Instant::now();
    tracing::info!("Starting ingestion of {}KB (hint: {:?})", file_data.len() / 1024, hint);

    let sheet = excel::parse(file_data, hint)?;
    tracing::info!(
        "Parsed {} rows x {} columns in {:?}",
        sheet.row_count(),
        sheet.columns.len(),
        start.elapsed()
    );

    let profiles = excel::profile_columns(&sheet.rows, &sheet.columns);
    let classification = excel::analyzer::split_by_kind(&profiles);
    tracing::info!(
        "Classified columns: {} numeric, {} categorical; total {:?}",
        classification.numeric.len(),
        classification.categorical.len(),
        start.elapsed()
    );

    Ok(IngestResult {
        row_count: sheet.row_count(),
        columns: sheet.columns,
        rows: sheet.rows,
        numeric_columns: classification.numeric,
        categorical_columns: classification.categorical,
        profiles,
    })
}

/// [`ingest`] on the blocking pool, with size and row caps enforced.
pub async fn ingest_upload(
    file_data: Bytes,
    hint: Option<String>,
    limits: IngestLimits,
) -> Result<IngestResult, AppError> {
    if file_data.len() > limits.max_file_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File is {} bytes, limit is {}",
            file_data.len(),
            limits.max_file_size
        )));
    }

    let result = tokio::task::spawn_blocking(move || ingest(&file_data, hint.as_deref()))
        .await
        .map_err(|e| AppError::Internal(format!("Ingestion task failed: {}", e)))??;

    if result.row_count > limits.max_rows {
        return Err(AppError::PayloadTooLarge(format!(
            "Sheet has {} rows, limit is {}",
            result.row_count, limits.max_rows
        )));
    }
    Ok(result)
}

/// Aggregates stored rows for a chart query and shapes them for rendering.
pub fn chart_series(
    columns: &[String],
    rows: &[Row],
    query: &ChartQuery,
) -> Result<Option<ChartSeries>, SheetError> {
    let aggregates = excel::group(
        rows,
        columns,
        &query.category_column,
        &query.value_column,
        query.aggregation,
    )?;
    let series = excel::build_chart(&aggregates, query.chart_kind);
    if series.is_none() {
        tracing::info!(
            "No renderable data for {:?} of '{}' by '{}'",
            query.aggregation,
            query.value_column,
            query.category_column
        );
    }
    Ok(series)
}

/// [`chart_series`] over a stored dataset, run on the blocking pool.
pub async fn render_chart(
    dataset: Arc<StoredDataset>,
    query: ChartQuery,
) -> Result<Option<ChartSeries>, AppError> {
    let series = tokio::task::spawn_blocking(move || {
        chart_series(&dataset.data.columns, &dataset.data.rows, &query)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Chart task failed: {}", e)))??;
    Ok(series)
}

pub async fn load_file_from_url(url: &str) -> Result<Bytes, AppError> {
    let client = Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::FileProcessingError(format!("Failed to fetch file: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::FileProcessingError(
            format!("Failed to fetch file. Status: {}", response.status())
        ));
    }

    response
        .bytes()
        .await
        .map_err(|e| AppError::FileProcessingError(format!("Failed to read response bytes: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::{AggregationMethod, ChartKind};

    const SALES: &[u8] = b"region,amount,rep\nNorth,$1,200.00,ann\nSouth,300,bob\nNorth,50,cy\n,10,dee\n";

    #[test]
    fn ingest_reports_columns_and_kinds() {
        let result = ingest(b"region,amount\nNorth,12\nSouth,7\n", Some("sales.csv")).unwrap();
        assert_eq!(result.columns, vec!["region", "amount"]);
        assert_eq!(result.row_count, 2);
        assert_eq!(result.numeric_columns, vec!["amount"]);
        assert_eq!(result.categorical_columns, vec!["region"]);
        assert_eq!(result.profiles.len(), 2);
    }

    #[test]
    fn quoted_csv_values_feed_the_chart() {
        let data = b"region,amount\nNorth,\"$1,200.00\"\nSouth,300\nNorth,50\n,10\n";
        let result = ingest(data, Some("text/csv")).unwrap();
        let query = ChartQuery {
            category_column: "region".to_string(),
            value_column: "amount".to_string(),
            aggregation: AggregationMethod::Sum,
            chart_kind: ChartKind::Pie,
        };
        let series = chart_series(&result.columns, &result.rows, &query).unwrap().unwrap();
        assert_eq!(series.labels, vec!["North", "South", "Unknown"]);
        assert_eq!(series.values, vec![1250.0, 300.0, 10.0]);
    }

    #[test]
    fn chart_series_rejects_missing_columns() {
        let result = ingest(SALES, Some("text/csv")).unwrap();
        let query = ChartQuery {
            category_column: "territory".to_string(),
            value_column: "amount".to_string(),
            aggregation: AggregationMethod::Count,
            chart_kind: ChartKind::Bar,
        };
        assert_eq!(
            chart_series(&result.columns, &result.rows, &query),
            Err(SheetError::InvalidColumn("territory".to_string()))
        );
    }

    #[tokio::test]
    async fn stored_datasets_render_off_the_async_thread() {
        let data = ingest(b"region,amount\nNorth,12\nSouth,7\nNorth,3\n", Some("text/csv")).unwrap();
        let dataset = Arc::new(StoredDataset {
            id: uuid::Uuid::new_v4(),
            file_name: None,
            created_at: chrono::Utc::now(),
            data,
        });
        let query = ChartQuery {
            category_column: "region".to_string(),
            value_column: "amount".to_string(),
            aggregation: AggregationMethod::Average,
            chart_kind: ChartKind::Bar,
        };

        let series = render_chart(Arc::clone(&dataset), query.clone()).await.unwrap().unwrap();
        assert_eq!(series.labels, vec!["North", "South"]);
        assert_eq!(series.values, vec![7.5, 7.0]);

        let missing = ChartQuery { value_column: "cost".to_string(), ..query };
        let err = render_chart(dataset, missing).await.unwrap_err();
        assert!(matches!(err, AppError::Sheet(SheetError::InvalidColumn(_))));
    }

    #[tokio::test]
    async fn upload_limits_are_enforced() {
        let limits = IngestLimits { max_file_size: 8, max_rows: 100 };
        let err = ingest_upload(Bytes::from_static(SALES), None, limits).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        let limits = IngestLimits { max_file_size: 1024, max_rows: 2 };
        let err = ingest_upload(Bytes::from_static(SALES), None, limits).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        let limits = IngestLimits { max_file_size: 1024, max_rows: 10 };
        let result = ingest_upload(Bytes::from_static(SALES), None, limits).await.unwrap();
        assert_eq!(result.row_count, 4);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::excel::{ChartQuery, ChartSeries, ColumnProfile, Row};
use crate::services::store::{ChartConfig, StoredDataset};

/// Rows echoed back with an upload so the client can show a preview table.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(rename = "type")]
    pub file_type: String,
    pub signed_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: Uuid,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub profiles: Vec<ColumnProfile>,
    pub sample_rows: Vec<Row>,
}

impl From<&StoredDataset> for DatasetSummary {
    fn from(dataset: &StoredDataset) -> Self {
        let data = &dataset.data;
        Self {
            id: dataset.id,
            file_name: dataset.file_name.clone(),
            created_at: dataset.created_at,
            columns: data.columns.clone(),
            row_count: data.row_count,
            numeric_columns: data.numeric_columns.clone(),
            categorical_columns: data.categorical_columns.clone(),
            profiles: data.profiles.clone(),
            sample_rows: data.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveChartRequest {
    pub title: Option<String>,
    #[serde(flatten)]
    pub query: ChartQuery,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChartDataResponse {
    pub chart: ChartConfig,
    /// `null` when the chart has nothing to draw.
    pub series: Option<ChartSeries>,
}

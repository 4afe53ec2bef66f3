use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::excel::{ChartQuery, IngestResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDataset {
    pub id: Uuid,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub data: IngestResult,
}

/// A persisted chart configuration over one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub title: String,
    #[serde(flatten)]
    pub query: ChartQuery,
    pub created_at: DateTime<Utc>,
}

/// Datasets are shared, not copied: a lookup hands out the stored `Arc`.
pub trait DatasetStore: Send + Sync {
    fn insert(&self, dataset: Arc<StoredDataset>);
    fn get(&self, id: Uuid) -> Option<Arc<StoredDataset>>;
}

pub trait ChartStore: Send + Sync {
    fn save(&self, config: ChartConfig);
    fn get(&self, id: Uuid) -> Option<ChartConfig>;
    /// Configs for a dataset, oldest first.
    fn list_for_dataset(&self, dataset_id: Uuid) -> Vec<ChartConfig>;
    fn delete(&self, id: Uuid) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryDatasetStore {
    datasets: RwLock<HashMap<Uuid, Arc<StoredDataset>>>,
}

impl DatasetStore for InMemoryDatasetStore {
    fn insert(&self, dataset: Arc<StoredDataset>) {
        tracing::debug!("Storing dataset {} ({} rows)", dataset.id, dataset.data.row_count);
        self.datasets.write().insert(dataset.id, dataset);
    }

    fn get(&self, id: Uuid) -> Option<Arc<StoredDataset>> {
        self.datasets.read().get(&id).cloned()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryChartStore {
    charts: RwLock<HashMap<Uuid, ChartConfig>>,
}

impl ChartStore for InMemoryChartStore {
    fn save(&self, config: ChartConfig) {
        tracing::debug!("Saving chart {} for dataset {}", config.id, config.dataset_id);
        self.charts.write().insert(config.id, config);
    }

    fn get(&self, id: Uuid) -> Option<ChartConfig> {
        self.charts.read().get(&id).cloned()
    }

    fn list_for_dataset(&self, dataset_id: Uuid) -> Vec<ChartConfig> {
        let mut configs: Vec<ChartConfig> = self
            .charts
            .read()
            .values()
            .filter(|c| c.dataset_id == dataset_id)
            .cloned()
            .collect();
        configs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        configs
    }

    fn delete(&self, id: Uuid) -> bool {
        self.charts.write().remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::{AggregationMethod, ChartKind, IngestResult};
    use chrono::Duration;

    fn config(dataset_id: Uuid, title: &str, created_at: DateTime<Utc>) -> ChartConfig {
        ChartConfig {
            id: Uuid::new_v4(),
            dataset_id,
            title: title.to_string(),
            query: ChartQuery {
                category_column: "region".to_string(),
                value_column: "sales".to_string(),
                aggregation: AggregationMethod::Sum,
                chart_kind: ChartKind::Bar,
            },
            created_at,
        }
    }

    #[test]
    fn charts_are_listed_per_dataset_oldest_first() {
        let store = InMemoryChartStore::default();
        let dataset = Uuid::new_v4();
        let now = Utc::now();

        store.save(config(dataset, "second", now));
        store.save(config(dataset, "first", now - Duration::seconds(30)));
        store.save(config(Uuid::new_v4(), "elsewhere", now));

        let titles: Vec<String> = store
            .list_for_dataset(dataset)
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn dataset_lookups_share_the_stored_rows() {
        let store = InMemoryDatasetStore::default();
        let dataset = Arc::new(StoredDataset {
            id: Uuid::new_v4(),
            file_name: Some("sales.csv".to_string()),
            created_at: Utc::now(),
            data: IngestResult {
                columns: vec!["region".to_string()],
                row_count: 0,
                rows: Vec::new(),
                numeric_columns: Vec::new(),
                categorical_columns: vec!["region".to_string()],
                profiles: Vec::new(),
            },
        });
        store.insert(Arc::clone(&dataset));

        let first = store.get(dataset.id).unwrap();
        let second = store.get(dataset.id).unwrap();
        assert!(Arc::ptr_eq(&first, &dataset));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(store.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let store = InMemoryChartStore::default();
        let chart = config(Uuid::new_v4(), "pie", Utc::now());
        let id = chart.id;
        store.save(chart);

        assert!(store.get(id).is_some());
        assert!(store.delete(id));
        assert!(!store.delete(id));
        assert!(store.get(id).is_none());
    }

    #[test]
    fn chart_config_serializes_flat() {
        let chart = config(Uuid::new_v4(), "pie", Utc::now());
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["category_column"], "region");
        assert_eq!(json["aggregation"], "sum");
        assert_eq!(json["chart_kind"], "bar");
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const SAMPLE_SIZE: usize = 3;

/// A raw cell as read from the sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_str(""),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Number(f64),
            Text(String),
            Null(()),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => CellValue::Bool(b),
            Raw::Number(n) => CellValue::Number(n),
            Raw::Text(s) => CellValue::from(s),
            Raw::Null(()) => CellValue::Empty,
        })
    }
}

/// One data row keyed by column name. Every row carries every column.
pub type Row = HashMap<String, CellValue>;

/// The first worksheet of an upload: canonical column order plus its rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub sample_values: SmallVec<[String; SAMPLE_SIZE]>,
    pub empty_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnClassification {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedAggregate {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    Sum,
    Average,
    Count,
    Max,
    Min,
}

impl FromStr for AggregationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregationMethod::Sum),
            "average" | "avg" | "mean" => Ok(AggregationMethod::Average),
            "count" => Ok(AggregationMethod::Count),
            "max" => Ok(AggregationMethod::Max),
            "min" => Ok(AggregationMethod::Min),
            other => Err(format!("Unknown aggregation method: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
    Doughnut,
}

impl ChartKind {
    /// Maximum number of labels a chart of this kind renders.
    pub fn max_items(self) -> usize {
        match self {
            ChartKind::Pie | ChartKind::Doughnut => 10,
            ChartKind::Bar => 20,
            ChartKind::Line => 15,
        }
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pie" => Ok(ChartKind::Pie),
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "doughnut" => Ok(ChartKind::Doughnut),
            other => Err(format!("Unknown chart kind: {}", other)),
        }
    }
}

/// Chart-ready series; `labels` and `values` always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Axis selection and aggregation for one chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartQuery {
    pub category_column: String,
    pub value_column: String,
    pub aggregation: AggregationMethod,
    pub chart_kind: ChartKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Workbook,
    Csv { delimiter: u8 },
}

/// Everything the ingestion boundary hands to storage and column pickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResult {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub rows: Vec<Row>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub profiles: Vec<ColumnProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells_serialize_as_empty_string() {
        let mut row = Row::new();
        row.insert("a".to_string(), CellValue::Empty);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["a"], "");
    }

    #[test]
    fn cells_deserialize_from_json_scalars() {
        let cells: Vec<CellValue> = serde_json::from_str(r#"["x", 2.5, true, "", null]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                CellValue::Text("x".to_string()),
                CellValue::Number(2.5),
                CellValue::Bool(true),
                CellValue::Empty,
                CellValue::Empty,
            ]
        );
    }

    #[test]
    fn chart_kind_limits() {
        assert_eq!(ChartKind::Pie.max_items(), 10);
        assert_eq!(ChartKind::Doughnut.max_items(), 10);
        assert_eq!(ChartKind::Bar.max_items(), 20);
        assert_eq!(ChartKind::Line.max_items(), 15);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("AVERAGE".parse::<AggregationMethod>(), Ok(AggregationMethod::Average));
        assert_eq!(" Bar ".parse::<ChartKind>(), Ok(ChartKind::Bar));
        assert!("median".parse::<AggregationMethod>().is_err());
        assert!("scatter".parse::<ChartKind>().is_err());
    }

    #[test]
    fn number_display_matches_plain_formatting() {
        assert_eq!(CellValue::Number(10.0).to_string(), "10");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Bool(false).to_string(), "false");
        assert_eq!(CellValue::Empty.to_string(), "");
    }
}

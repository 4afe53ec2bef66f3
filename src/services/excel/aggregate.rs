use std::collections::HashMap;

use super::coerce::to_number;
use super::types::*;
use crate::error::SheetError;

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Default)]
struct GroupState {
    sum: f64,
    /// Rows that produced a numeric value.
    count: usize,
    /// Every row under the label, numeric or not.
    rows: usize,
    values: Vec<f64>,
}

impl GroupState {
    fn push(&mut self, value: Option<f64>) {
        self.rows += 1;
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
            self.values.push(value);
        }
    }

    fn finish(&self, method: AggregationMethod) -> Option<f64> {
        let value = match method {
            AggregationMethod::Count => return Some(self.rows as f64),
            _ if self.count == 0 => return None,
            AggregationMethod::Sum => self.sum,
            AggregationMethod::Average => self.sum / self.count as f64,
            AggregationMethod::Max => self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggregationMethod::Min => self.values.iter().copied().fold(f64::INFINITY, f64::min),
        };
        value.is_finite().then_some(value)
    }
}

/// The grouping key for a cell: its trimmed text, or `"Unknown"` when blank.
pub fn group_label(raw: Option<&CellValue>) -> String {
    let label = raw.map(|v| v.to_string()).unwrap_or_default();
    let label = label.trim();
    if label.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        label.to_string()
    }
}

/// Groups rows by `category_column` and reduces `value_column` per group.
///
/// Output follows first-seen label order. Groups whose reduction has no
/// numeric input (or overflows) are left out rather than reported as NaN.
pub fn group(
    rows: &[Row],
    columns: &[String],
    category_column: &str,
    value_column: &str,
    method: AggregationMethod,
) -> Result<Vec<GroupedAggregate>, SheetError> {
    for name in [category_column, value_column] {
        if !columns.iter().any(|c| c == name) {
            return Err(SheetError::InvalidColumn(name.to_string()));
        }
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, GroupState> = HashMap::new();

    for row in rows {
        let label = group_label(row.get(category_column));
        let value = row.get(value_column).and_then(to_number);

        if !groups.contains_key(&label) {
            order.push(label.clone());
        }
        groups.entry(label).or_default().push(value);
    }

    let aggregates: Vec<GroupedAggregate> = order
        .into_iter()
        .filter_map(|label| {
            let value = groups.get(&label)?.finish(method)?;
            Some(GroupedAggregate { label, value })
        })
        .collect();

    tracing::debug!(
        "Grouped {} rows by '{}' into {} {:?} aggregates of '{}'",
        rows.len(),
        category_column,
        aggregates.len(),
        method,
        value_column
    );
    Ok(aggregates)
}

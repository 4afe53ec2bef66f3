use super::types::{ChartKind, ChartSeries, GroupedAggregate};

/// Shapes aggregates into a chart series: non-positive values are dropped, the
/// rest sorted largest first and capped at the chart kind's item limit.
///
/// `None` means there is nothing to draw; it is not an error.
pub fn build(aggregates: &[GroupedAggregate], chart_kind: ChartKind) -> Option<ChartSeries> {
    let mut entries: Vec<&GroupedAggregate> = aggregates
        .iter()
        .filter(|a| a.value.is_finite() && a.value > 0.0)
        .collect();

    // stable, so equal values keep their incoming order
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries.truncate(chart_kind.max_items());

    if entries.is_empty() {
        return None;
    }

    let (labels, values) = entries
        .into_iter()
        .map(|a| (a.label.clone(), a.value))
        .unzip();
    Some(ChartSeries { labels, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregates(values: &[f64]) -> Vec<GroupedAggregate> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| GroupedAggregate {
                label: format!("L{}", i),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn bar_charts_keep_top_twenty_descending() {
        let values: Vec<f64> = (1..=25).map(|v| v as f64).collect();
        let series = build(&aggregates(&values), ChartKind::Bar).unwrap();

        assert_eq!(series.labels.len(), 20);
        assert_eq!(series.values.len(), series.labels.len());
        assert_eq!(series.values[0], 25.0);
        assert_eq!(series.labels[0], "L24");
        assert_eq!(series.values[19], 6.0);
        assert!(series.values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn limits_per_chart_kind() {
        let values: Vec<f64> = (1..=30).map(|v| v as f64).collect();
        let aggregates = aggregates(&values);
        assert_eq!(build(&aggregates, ChartKind::Pie).unwrap().labels.len(), 10);
        assert_eq!(build(&aggregates, ChartKind::Doughnut).unwrap().labels.len(), 10);
        assert_eq!(build(&aggregates, ChartKind::Line).unwrap().labels.len(), 15);
    }

    #[test]
    fn non_positive_values_are_dropped() {
        let series = build(&aggregates(&[0.0, -4.0, 3.0]), ChartKind::Pie).unwrap();
        assert_eq!(series.labels, vec!["L2"]);
        assert_eq!(series.values, vec![3.0]);
    }

    #[test]
    fn nothing_renderable_is_none() {
        assert_eq!(build(&aggregates(&[0.0, -1.0, -2.5]), ChartKind::Bar), None);
        assert_eq!(build(&[], ChartKind::Line), None);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let series = build(&aggregates(&[2.0, 5.0, 2.0]), ChartKind::Bar).unwrap();
        assert_eq!(series.labels, vec!["L1", "L0", "L2"]);
    }
}

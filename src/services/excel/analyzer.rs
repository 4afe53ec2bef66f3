use rayon::prelude::*;
use smallvec::SmallVec;

use super::coerce::to_number;
use super::types::*;

/// Rows inspected per column when deciding its kind.
pub const TYPE_DETECTION_ROWS: usize = 20;

/// A column is numeric when at least 7 in 10 sampled non-empty values coerce.
const NUMERIC_RATIO_NUM: usize = 7;
const NUMERIC_RATIO_DEN: usize = 10;

/// Profiles every column from the first [`TYPE_DETECTION_ROWS`] rows. The
/// result has one profile per column, in column order.
pub fn profile_columns(rows: &[Row], columns: &[String]) -> Vec<ColumnProfile> {
    let sample = &rows[..rows.len().min(TYPE_DETECTION_ROWS)];

    columns
        .par_iter()
        .map(|name| profile_column(sample, name))
        .collect()
}

pub fn classify(rows: &[Row], columns: &[String]) -> ColumnClassification {
    split_by_kind(&profile_columns(rows, columns))
}

pub fn split_by_kind(profiles: &[ColumnProfile]) -> ColumnClassification {
    let mut classification = ColumnClassification::default();
    for profile in profiles {
        match profile.kind {
            ColumnKind::Numeric => classification.numeric.push(profile.name.clone()),
            ColumnKind::Categorical => classification.categorical.push(profile.name.clone()),
        }
    }
    classification
}

fn profile_column(sample: &[Row], name: &str) -> ColumnProfile {
    let mut sample_values = SmallVec::<[String; SAMPLE_SIZE]>::new();
    let mut empty_count = 0;
    let mut present = 0;
    let mut numeric = 0;

    for value in sample.iter().map(|row| row.get(name)) {
        let value = match value {
            Some(value) if !value.is_empty() => value,
            _ => {
                empty_count += 1;
                continue;
            }
        };
        present += 1;
        if to_number(value).is_some() {
            numeric += 1;
        }
        if sample_values.len() < SAMPLE_SIZE {
            sample_values.push(value.to_string());
        }
    }

    ColumnProfile {
        name: name.to_string(),
        kind: detect_column_kind(numeric, present),
        sample_values,
        empty_count,
    }
}

pub fn detect_column_kind(numeric_count: usize, sampled: usize) -> ColumnKind {
    // a ratio of exactly 0.7 (7 of 10) counts as numeric
    if sampled > 0 && numeric_count * NUMERIC_RATIO_DEN >= sampled * NUMERIC_RATIO_NUM {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

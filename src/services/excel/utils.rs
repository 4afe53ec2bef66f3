use std::collections::HashSet;

/// Turns a raw header cell into a unique column name. Blank headers are named
/// after their 1-based position; repeats get a numeric suffix.
pub fn clean_column_name(name: &str, position: usize, existing_names: &mut HashSet<String>) -> String {
    let trimmed = name.trim();
    let base_name = if trimmed.is_empty() {
        format!("Column {}", position + 1)
    } else {
        trimmed.to_string()
    };

    // If the name already exists, add a numeric suffix
    let mut cleaned = base_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", base_name, counter);
        counter += 1;
    }

    cleaned
}

pub fn clean_headers<I, S>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut existing_names = HashSet::new();
    cells
        .into_iter()
        .enumerate()
        .map(|(idx, cell)| clean_column_name(cell.as_ref(), idx, &mut existing_names))
        .collect()
}

/// Lower-cased file extension of a name or URL path, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let path = name.split(['?', '#']).next().unwrap_or(name);
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_duplicate_headers_are_made_unique() {
        let headers = clean_headers(["Region", " ", "Sales", "Region", "Region", ""]);
        assert_eq!(
            headers,
            vec!["Region", "Column 2", "Sales", "Region_1", "Region_2", "Column 6"]
        );
    }

    #[test]
    fn headers_keep_their_spelling() {
        let headers = clean_headers(["Unit Price ($)", "  qty  "]);
        assert_eq!(headers, vec!["Unit Price ($)", "qty"]);
    }

    #[test]
    fn extension_parsing() {
        assert_eq!(extension_of("report.XLSX").as_deref(), Some("xlsx"));
        assert_eq!(
            extension_of("https://bucket/path/data.csv?X-Amz-Signature=abc.def").as_deref(),
            Some("csv")
        );
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }
}

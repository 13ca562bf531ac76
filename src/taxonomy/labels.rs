use std::collections::HashSet;

/// Splits comma-separated free text into trimmed, non-empty labels.
///
/// Exact duplicates are dropped keeping the first occurrence. Labels that
/// differ only by case stay distinct here; they meet again at resolution time
/// through slug equality.
pub fn split_labels(text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    text.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(*label))
        .map(str::to_string)
        .collect()
}

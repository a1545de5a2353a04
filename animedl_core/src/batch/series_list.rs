use std::path::Path;

use crate::types::ConfigError;

/// Reads a newline-delimited list of series URLs. Blank lines and lines
/// starting with `#` are skipped.
pub async fn read_series_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::BatchFile {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_series_list(&text))
}

pub fn parse_series_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Empties a processed batch file, leaving it in place for the next run.
pub async fn clear_series_list(path: &Path) -> std::io::Result<()> {
    tokio::fs::write(path, "").await
}

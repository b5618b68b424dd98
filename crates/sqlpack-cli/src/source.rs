use std::path::Path;

/// How to read the input file.
#[derive(Debug, Clone, Copy)]
pub struct CsvSettings {
    pub has_header: bool,
    pub delimiter: u8,
}

/// Read every record of `path` as a row of text fields.
///
/// Records may have differing field counts; the packer does not require a
/// fixed arity.
pub fn read_rows(path: &Path, settings: CsvSettings) -> anyhow::Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(settings.has_header)
        .delimiter(settings.delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", path.display()))?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| anyhow::anyhow!("failed to read record {i} of {}: {e}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(target: "sqlpack.source", rows = rows.len(), path = %path.display(), "read csv");
    Ok(rows)
}

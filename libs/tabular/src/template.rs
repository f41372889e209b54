//! On-demand delimited-text templates: canonical headers plus sample rows.
//! The output is handed straight to the caller and never persisted.

use crate::TabularError;

/// Render a CSV template with the given headers and sample rows.
pub fn render_csv(headers: &[&str], sample_rows: &[&[&str]]) -> Result<String, TabularError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(headers)
        .map_err(|e| TabularError::Template(e.to_string()))?;
    for row in sample_rows {
        writer
            .write_record(*row)
            .map_err(|e| TabularError::Template(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TabularError::Template(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TabularError::Template(e.to_string()))
}

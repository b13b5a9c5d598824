use std::path::Path;

use crate::analysis::FitSummary;
use crate::error::GrowthError;

/// Serialize a fit summary to a JSON string.
pub fn summary_to_json(summary: &FitSummary, pretty: bool) -> Result<String, GrowthError> {
    let content = if pretty {
        serde_json::to_string_pretty(summary)?
    } else {
        serde_json::to_string(summary)?
    };
    Ok(content)
}

/// Write a fit summary to a JSON file.
pub fn write_summary_json(
    summary: &FitSummary,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), GrowthError> {
    std::fs::write(path.as_ref(), summary_to_json(summary, pretty)?)?;
    Ok(())
}

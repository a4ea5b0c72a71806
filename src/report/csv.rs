use std::fs;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, VbrError};
use crate::report::JobRow;

/// Writes rows next to `path` first and renames into place, so a reader never
/// sees a half-written export.
pub fn write_csv(path: &Path, rows: &[JobRow], delimiter: u8) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir)
            .map_err(|e| VbrError::message(format!("create {}: {}", dir.display(), e)))?;
    }
    let tmp = NamedTempFile::new_in(dir)
        .map_err(|e| VbrError::message(format!("create temp file in {}: {}", dir.display(), e)))?;
    {
        let mut writer = ::csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(tmp.as_file());
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| VbrError::message(format!("encode csv row {}: {}", row.name, e)))?;
        }
        writer
            .flush()
            .map_err(|e| VbrError::message(format!("write {}: {}", path.display(), e)))?;
    }
    tmp.persist(path)
        .map_err(|e| VbrError::message(format!("write {}: {}", path.display(), e.error)))?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv export");
    Ok(())
}

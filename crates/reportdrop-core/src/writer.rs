//! Output file handling

use crate::{CoreError, CoreResult};
use std::path::Path;
use tracing::info;

/// Replace the content of `path` with `data`
///
/// Truncates and rewrites in place. The parent directory must exist.
pub fn write_report(path: &Path, data: &[u8]) -> CoreResult<()> {
    std::fs::write(path, data)
        .map_err(|e| CoreError::StorageError(format!("{}: {}", path.display(), e)))?;

    info!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

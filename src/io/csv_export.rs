use std::path::Path;

use crate::error::{Error, Result};
use crate::model::layout::display_percent;
use crate::model::status::status_label;
use crate::model::Row;

/// Export the visible rows to a semicolon-delimited CSV file that
/// [`super::csv_import`] can read back.
///
/// Columns: Id ; Task Label ; Start Date ; End Date ; Status ; Progress ; Parent ; Depth
/// Returns the number of rows written.
pub fn export_rows(rows: &[Row<'_>], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
    let count = write_rows(rows, file)?;
    log::info!("Exported {} rows to {}", count, path.display());
    Ok(count)
}

pub fn write_rows<W: std::io::Write>(rows: &[Row<'_>], writer: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record([
        "Id",
        "Task Label",
        "Start Date",
        "End Date",
        "Status",
        "Progress",
        "Parent",
        "Depth",
    ])?;

    for row in rows {
        let task = row.task;
        let start = task.start.format("%Y-%m-%d").to_string();
        let end = task.end.format("%Y-%m-%d").to_string();
        let status = task.status.as_deref().map(status_label).unwrap_or_default();
        let progress = format!("{}%", display_percent(task.effective_progress()));
        let depth = row.depth.to_string();
        wtr.write_record([
            task.id.as_str(),
            task.name.as_str(),
            start.as_str(),
            end.as_str(),
            status.as_str(),
            progress.as_str(),
            row.parent_id.unwrap_or(""),
            depth.as_str(),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(rows.len())
}

use crate::error::Result;
use crate::model::KNOWN_COLUMNS;
use csv::Writer;
use std::path::PathBuf;
use tracing::info;

/// Writes an empty dataset with the recognised column headers.
pub fn init_csv(filename: &str) -> Result<PathBuf> {
    let csv_filename = if filename.ends_with(".csv") {
        filename.to_string()
    } else {
        format!("{}.csv", filename)
    };

    let mut wtr = Writer::from_path(&csv_filename)?;
    wtr.write_record(KNOWN_COLUMNS)?;
    wtr.flush()?;
    info!(path = %csv_filename, "created dataset template");
    Ok(PathBuf::from(csv_filename))
}

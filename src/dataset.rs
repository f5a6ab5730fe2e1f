use crate::error::Result;
use crate::model::RawRecord;
use csv::ReaderBuilder;
use std::io::Read;
use tracing::{info, warn};

/// Upper bound on search candidates, so very large exports stay listable.
pub const MAX_CANDIDATES: usize = 2000;

/// Reads a header-first CSV into records.
///
/// Rows that cannot be decoded are skipped with a warning rather than failing
/// the import. An unreadable header row is an error.
pub fn parse_dataset<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    rdr.headers()?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (idx, result) in rdr.deserialize::<RawRecord>().enumerate() {
        match result {
            Ok(record) if record.is_empty() => {}
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!(row = idx + 2, error = %e, "skipping malformed row");
            }
        }
    }

    info!(records = records.len(), skipped, "dataset parsed");
    Ok(records)
}

/// Records whose `WO #` contains `query`, ignoring case, in dataset order.
///
/// An empty query lists the head of the dataset. Both are capped at
/// [`MAX_CANDIDATES`].
pub fn search<'a>(dataset: &'a [RawRecord], query: &str) -> Vec<&'a RawRecord> {
    if query.is_empty() {
        return dataset.iter().take(MAX_CANDIDATES).collect();
    }

    let needle = query.to_lowercase();
    dataset
        .iter()
        .filter(|r| {
            r.work_order()
                .is_some_and(|wo| wo.to_lowercase().contains(&needle))
        })
        .take(MAX_CANDIDATES)
        .collect()
}

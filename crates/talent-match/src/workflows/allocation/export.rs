use std::io::Write;

use super::batch::Batch;
use super::domain::{Candidate, Role};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write batch export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush batch export: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes `Role,Candidate,Score` rows for every match in the batch.
///
/// Titles and names come from the supplied records; unknown ids are written as-is.
pub fn write_batch_csv<W: Write>(
    batch: &Batch,
    roles: &[Role],
    candidates: &[Candidate],
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Role", "Candidate", "Score"])?;

    for entry in &batch.matches {
        let role = roles
            .iter()
            .find(|role| role.id == entry.role_id)
            .map(|role| role.title.as_str())
            .unwrap_or(entry.role_id.0.as_str());
        let candidate = candidates
            .iter()
            .find(|candidate| candidate.id == entry.candidate_id)
            .map(|candidate| candidate.name.as_str())
            .unwrap_or(entry.candidate_id.0.as_str());
        let score = entry.total_score.to_string();

        csv_writer.write_record([role, candidate, score.as_str()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

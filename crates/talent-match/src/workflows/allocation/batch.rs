use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CandidateId, MatchScore, RoleId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub String);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timestamped snapshot of ranked matches handed to the approval workflow.
///
/// `matches` is never mutated after creation; sending only stamps `sent_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    pub matches: Vec<MatchScore>,
}

impl Batch {
    pub fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }

    pub fn role_ids(&self) -> Vec<RoleId> {
        let mut ids: Vec<RoleId> = Vec::new();
        for entry in &self.matches {
            if !ids.contains(&entry.role_id) {
                ids.push(entry.role_id.clone());
            }
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("batch {0} not found")]
    NotFound(BatchId),
}

/// Keeps every created batch plus the working shortlist of the current one.
///
/// The shortlist starts as a copy of the current batch's matches and shrinks as reservations
/// withdraw candidates from competing roles; the batch snapshot itself stays intact.
#[derive(Debug, Clone, Default)]
pub struct BatchCoordinator {
    batches: Vec<Batch>,
    current: Option<BatchId>,
    shortlist: Vec<MatchScore>,
    sequence: u64,
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrates persisted batches. An unknown `current` id leaves no batch current.
    pub fn restore(
        batches: Vec<Batch>,
        current: Option<BatchId>,
        shortlist: Option<Vec<MatchScore>>,
    ) -> Self {
        let current = current.filter(|id| batches.iter().any(|batch| &batch.id == id));
        let shortlist = match (&current, shortlist) {
            (Some(_), Some(shortlist)) => shortlist,
            (Some(id), None) => batches
                .iter()
                .find(|batch| &batch.id == id)
                .map(|batch| batch.matches.clone())
                .unwrap_or_default(),
            (None, _) => Vec::new(),
        };
        let sequence = batches.len() as u64;

        Self {
            batches,
            current,
            shortlist,
            sequence,
        }
    }

    pub fn create_batch(&mut self, matches: Vec<MatchScore>, now: DateTime<Utc>) -> Batch {
        self.sequence += 1;
        let id = BatchId(format!(
            "batch-{}-{:03}",
            now.timestamp_millis(),
            self.sequence
        ));

        let batch = Batch {
            id: id.clone(),
            created_at: now,
            sent_at: None,
            matches,
        };

        self.shortlist = batch.matches.clone();
        self.batches.push(batch.clone());
        self.current = Some(id);
        batch
    }

    /// Stamps `sent_at` once. Sending an already sent batch keeps the original timestamp.
    pub fn send_batch(&mut self, id: &BatchId, now: DateTime<Utc>) -> Result<Batch, BatchError> {
        let batch = self
            .batches
            .iter_mut()
            .find(|batch| &batch.id == id)
            .ok_or_else(|| BatchError::NotFound(id.clone()))?;

        if !batch.is_sent() {
            batch.sent_at = Some(now);
        }
        Ok(batch.clone())
    }

    /// Drops shortlist entries pairing `candidate_id` with any role other than `keep_role`.
    pub fn withdraw_candidate(&mut self, candidate_id: &CandidateId, keep_role: &RoleId) -> usize {
        let before = self.shortlist.len();
        self.shortlist
            .retain(|entry| !(&entry.candidate_id == candidate_id && &entry.role_id != keep_role));
        before - self.shortlist.len()
    }

    pub fn get(&self, id: &BatchId) -> Option<&Batch> {
        self.batches.iter().find(|batch| &batch.id == id)
    }

    pub fn current(&self) -> Option<&Batch> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    pub fn current_id(&self) -> Option<&BatchId> {
        self.current.as_ref()
    }

    pub fn shortlist(&self) -> &[MatchScore] {
        &self.shortlist
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::batch::{Batch, BatchId};
use super::domain::{Candidate, CandidateId, Interview, MatchScore, PipelineEntry, Role, RoleId};
use super::ledger::Reservation;

/// Manager feedback captured when a candidate is turned down for a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub candidate_id: CandidateId,
    pub role_id: RoleId,
    pub reason: String,
    pub rejected_at: DateTime<Utc>,
    pub rejected_by: String,
}

/// Rating and comment left alongside an approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalFeedback {
    pub candidate_id: CandidateId,
    pub role_id: RoleId,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub approved_at: DateTime<Utc>,
    pub approved_by: String,
}

/// Flat persisted state. Every list is keyed by its record's string identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationSnapshot {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub interviews: Vec<Interview>,
    #[serde(default)]
    pub pipeline: Vec<PipelineEntry>,
    #[serde(default)]
    pub batches: Vec<Batch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_batch: Option<BatchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortlist: Option<Vec<MatchScore>>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    #[serde(default)]
    pub rejections: Vec<Rejection>,
    #[serde(default)]
    pub approvals: Vec<ApprovalFeedback>,
}

impl AllocationSnapshot {
    pub fn candidate(&self, id: &CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| &candidate.id == id)
    }

    pub fn role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.iter().find(|role| &role.id == id)
    }

    pub fn interview(&self, candidate_id: &CandidateId, role_id: &RoleId) -> Option<&Interview> {
        self.interviews.iter().find(|interview| {
            &interview.candidate_id == candidate_id && &interview.role_id == role_id
        })
    }

    /// Inserts the role or replaces the record with the same id.
    pub fn upsert_role(&mut self, role: Role) {
        match self.roles.iter_mut().find(|existing| existing.id == role.id) {
            Some(existing) => *existing = role,
            None => self.roles.push(role),
        }
    }
}

/// Storage abstraction so the engine never touches durable state directly.
pub trait AllocationRepository: Send + Sync {
    fn load(&self) -> Result<AllocationSnapshot, RepositoryError>;
    fn save(&self, snapshot: &AllocationSnapshot) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("stored allocation state is corrupt: {0}")]
    Corrupt(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Notifications emitted after state changes, consumed by the application shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationEvent {
    BatchCreated {
        batch_id: BatchId,
        matches: usize,
    },
    BatchSent {
        batch_id: BatchId,
    },
    CandidateReserved {
        candidate_id: CandidateId,
        role_id: RoleId,
        actor: String,
        withdrawn: usize,
    },
    ReservationConflict {
        candidate_id: CandidateId,
        existing_role_id: RoleId,
        requested_role_id: RoleId,
    },
    ReservationReleased {
        candidate_id: CandidateId,
        role_id: RoleId,
    },
    CandidateRejected {
        candidate_id: CandidateId,
        role_id: RoleId,
        reason: String,
    },
}

impl AllocationEvent {
    pub const fn label(&self) -> &'static str {
        match self {
            AllocationEvent::BatchCreated { .. } => "batch_created",
            AllocationEvent::BatchSent { .. } => "batch_sent",
            AllocationEvent::CandidateReserved { .. } => "candidate_reserved",
            AllocationEvent::ReservationConflict { .. } => "reservation_conflict",
            AllocationEvent::ReservationReleased { .. } => "reservation_released",
            AllocationEvent::CandidateRejected { .. } => "candidate_rejected",
        }
    }
}

/// Outbound hook for allocation events (toasts, e-mail, chat adapters).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: AllocationEvent) -> Result<(), PublishError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

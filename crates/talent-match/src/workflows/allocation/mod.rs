//! Candidate-to-role matching and allocation.
//!
//! Scoring, constraint checks, and ranking are pure functions over in-memory records. The
//! reservation ledger is the only shared mutable state with an invariant of its own (one active
//! reservation per candidate). The service facade wires both to an injected repository and
//! event publisher.

pub mod batch;
pub mod constraints;
pub mod domain;
pub mod export;
pub mod ledger;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use batch::{Batch, BatchCoordinator, BatchError, BatchId};
pub use constraints::{ConstraintReport, ConstraintViolation};
pub use domain::{
    Candidate, CandidateId, CandidateOrigin, HardConstraints, InternalHistory, Interview,
    LanguageLevel, LanguageRequirement, LanguageSkill, MatchScore, PanelScores, PipelineEntry,
    PipelineStage, Role, RoleConfigurationError, RoleId, ScoreBreakdown, ScoringWeights,
    SourcingStrategy, WorkModel,
};
pub use export::{write_batch_csv, ExportError};
pub use ledger::{Reservation, ReservationConflict, ReservationLedger};
pub use ranking::{top_matches_for_candidate, top_matches_for_role, DEFAULT_LIMIT};
pub use repository::{
    AllocationEvent, AllocationRepository, AllocationSnapshot, ApprovalFeedback, EventPublisher,
    PublishError, Rejection, RepositoryError,
};
pub use router::allocation_router;
pub use scoring::{score, MatchEngine};
pub use service::{
    AllocationService, AllocationServiceError, AllocationSettings, ApprovalRequest, MatchView,
    RejectionRequest, RoleShortlist,
};

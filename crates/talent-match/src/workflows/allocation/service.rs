use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::batch::{Batch, BatchCoordinator, BatchError, BatchId};
use super::domain::{CandidateId, MatchScore, Role, RoleConfigurationError, RoleId};
use super::export::{self, ExportError};
use super::ledger::{Reservation, ReservationConflict, ReservationLedger};
use super::ranking::{self, DEFAULT_LIMIT};
use super::repository::{
    AllocationEvent, AllocationRepository, AllocationSnapshot, ApprovalFeedback, EventPublisher,
    PublishError, Rejection, RepositoryError,
};
use super::scoring::{MatchEngine, DEFAULT_EVIDENCE_LIMIT};

/// Entries shown per role in the manager approval queue.
const APPROVAL_QUEUE_DEPTH: usize = 3;

/// Tunables the service applies on top of the pure engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSettings {
    pub default_limit: usize,
    pub evidence_limit: usize,
    pub start_buffer_days: u32,
    /// Recorded on approvals and rejections that arrive without an actor.
    pub default_actor: String,
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            evidence_limit: DEFAULT_EVIDENCE_LIMIT,
            start_buffer_days: 30,
            default_actor: "manager".to_string(),
        }
    }
}

/// Direction used when generating a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchView {
    #[default]
    ByRole,
    ByCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub candidate_id: CandidateId,
    pub role_id: RoleId,
    #[serde(default)]
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionRequest {
    pub candidate_id: CandidateId,
    pub role_id: RoleId,
    #[serde(default)]
    pub actor: String,
    pub reason: String,
}

/// One role's slice of the current batch as presented to its hiring manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleShortlist {
    pub role_id: RoleId,
    pub title: String,
    pub start_preference: Option<NaiveDate>,
    pub start_buffer_violation: bool,
    pub matches: Vec<MatchScore>,
}

/// Facade composing the matching engine, reservation ledger, and batch coordinator with the
/// injected repository and event publisher.
pub struct AllocationService<R, P> {
    repository: Arc<R>,
    events: Arc<P>,
    engine: MatchEngine,
    settings: AllocationSettings,
    ledger: ReservationLedger,
    batches: Mutex<BatchCoordinator>,
}

impl<R, P> AllocationService<R, P>
where
    R: AllocationRepository + 'static,
    P: EventPublisher + 'static,
{
    /// Restores ledger and batch state from the repository.
    pub fn new(
        repository: Arc<R>,
        events: Arc<P>,
        settings: AllocationSettings,
    ) -> Result<Self, AllocationServiceError> {
        let snapshot = repository.load()?;
        let ledger = ReservationLedger::restore(snapshot.reservations).map_err(|conflict| {
            RepositoryError::Corrupt(format!("duplicate reservations: {conflict}"))
        })?;
        let batches =
            BatchCoordinator::restore(snapshot.batches, snapshot.current_batch, snapshot.shortlist);

        Ok(Self {
            repository,
            events,
            engine: MatchEngine::new(settings.evidence_limit),
            settings,
            ledger,
            batches: Mutex::new(batches),
        })
    }

    pub fn settings(&self) -> &AllocationSettings {
        &self.settings
    }

    fn coordinator(&self) -> MutexGuard<'_, BatchCoordinator> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.settings.default_limit)
    }

    fn actor_or_default(&self, actor: String) -> String {
        let actor = actor.trim();
        if actor.is_empty() {
            self.settings.default_actor.clone()
        } else {
            actor.to_string()
        }
    }

    fn persist(
        &self,
        coordinator: &BatchCoordinator,
        apply: impl FnOnce(&mut AllocationSnapshot),
    ) -> Result<(), AllocationServiceError> {
        let mut snapshot = self.repository.load()?;
        snapshot.batches = coordinator.batches().to_vec();
        snapshot.current_batch = coordinator.current_id().cloned();
        snapshot.shortlist = coordinator
            .current_id()
            .map(|_| coordinator.shortlist().to_vec());
        snapshot.reservations = self.ledger.reservations();
        apply(&mut snapshot);
        self.repository.save(&snapshot)?;
        Ok(())
    }

    /// Scores a single pair against the current records.
    pub fn score(
        &self,
        candidate_id: &CandidateId,
        role_id: &RoleId,
    ) -> Result<MatchScore, AllocationServiceError> {
        let snapshot = self.repository.load()?;
        let candidate = snapshot
            .candidate(candidate_id)
            .ok_or_else(|| AllocationServiceError::CandidateNotFound(candidate_id.clone()))?;
        let role = snapshot
            .role(role_id)
            .ok_or_else(|| AllocationServiceError::RoleNotFound(role_id.clone()))?;

        let interview = snapshot.interview(candidate_id, role_id);
        Ok(self.engine.score(candidate, role, interview))
    }

    pub fn top_matches_for_role(
        &self,
        role_id: &RoleId,
        limit: Option<usize>,
    ) -> Result<Vec<MatchScore>, AllocationServiceError> {
        let snapshot = self.repository.load()?;
        let role = snapshot
            .role(role_id)
            .ok_or_else(|| AllocationServiceError::RoleNotFound(role_id.clone()))?;

        Ok(ranking::top_matches_for_role(
            &self.engine,
            role,
            &snapshot.candidates,
            &snapshot.interviews,
            &snapshot.pipeline,
            self.limit(limit),
        ))
    }

    pub fn top_matches_for_candidate(
        &self,
        candidate_id: &CandidateId,
        limit: Option<usize>,
    ) -> Result<Vec<MatchScore>, AllocationServiceError> {
        let snapshot = self.repository.load()?;
        let candidate = snapshot
            .candidate(candidate_id)
            .ok_or_else(|| AllocationServiceError::CandidateNotFound(candidate_id.clone()))?;

        Ok(ranking::top_matches_for_candidate(
            &self.engine,
            candidate,
            &snapshot.roles,
            &snapshot.interviews,
            self.limit(limit),
        ))
    }

    /// Validates a role's scoring contract and stores it, replacing any role with the same id.
    pub fn register_role(&self, role: Role) -> Result<Role, AllocationServiceError> {
        role.validate()?;

        let coordinator = self.coordinator();
        let stored = role.clone();
        self.persist(&coordinator, move |snapshot| snapshot.upsert_role(stored))?;
        drop(coordinator);

        info!(role_id = %role.id, title = %role.title, "role registered");
        Ok(role)
    }

    /// Ranks every role (or every candidate) and snapshots the passing matches into a batch.
    pub fn generate_batch(&self, view: MatchView) -> Result<Batch, AllocationServiceError> {
        let snapshot = self.repository.load()?;
        let limit = self.settings.default_limit;

        let matches: Vec<MatchScore> = match view {
            MatchView::ByRole => snapshot
                .roles
                .iter()
                .flat_map(|role| {
                    ranking::top_matches_for_role(
                        &self.engine,
                        role,
                        &snapshot.candidates,
                        &snapshot.interviews,
                        &snapshot.pipeline,
                        limit,
                    )
                })
                .collect(),
            MatchView::ByCandidate => snapshot
                .candidates
                .iter()
                .flat_map(|candidate| {
                    ranking::top_matches_for_candidate(
                        &self.engine,
                        candidate,
                        &snapshot.roles,
                        &snapshot.interviews,
                        limit,
                    )
                })
                .collect(),
        };

        self.create_batch(matches)
    }

    pub fn create_batch(&self, matches: Vec<MatchScore>) -> Result<Batch, AllocationServiceError> {
        let mut coordinator = self.coordinator();
        let mut staged = coordinator.clone();
        let batch = staged.create_batch(matches, Utc::now());
        self.persist(&staged, |_| {})?;
        *coordinator = staged;
        drop(coordinator);

        info!(batch_id = %batch.id, matches = batch.matches.len(), "batch created");
        self.events.publish(AllocationEvent::BatchCreated {
            batch_id: batch.id.clone(),
            matches: batch.matches.len(),
        })?;
        Ok(batch)
    }

    pub fn send_batch(&self, batch_id: &BatchId) -> Result<Batch, AllocationServiceError> {
        let mut coordinator = self.coordinator();
        let resend = coordinator.get(batch_id).is_some_and(Batch::is_sent);
        let mut staged = coordinator.clone();
        let batch = staged.send_batch(batch_id, Utc::now())?;
        self.persist(&staged, |_| {})?;
        *coordinator = staged;
        drop(coordinator);

        info!(batch_id = %batch.id, resend, "batch sent for approval");
        self.events.publish(AllocationEvent::BatchSent {
            batch_id: batch.id.clone(),
        })?;
        Ok(batch)
    }

    pub fn batch(&self, batch_id: &BatchId) -> Result<Batch, AllocationServiceError> {
        self.coordinator()
            .get(batch_id)
            .cloned()
            .ok_or_else(|| BatchError::NotFound(batch_id.clone()).into())
    }

    /// Writes the batch as CSV using the current role titles and candidate names.
    pub fn export_batch<W: Write>(
        &self,
        batch_id: &BatchId,
        writer: W,
    ) -> Result<(), AllocationServiceError> {
        let batch = self.batch(batch_id)?;
        let snapshot = self.repository.load()?;
        export::write_batch_csv(&batch, &snapshot.roles, &snapshot.candidates, writer)?;
        Ok(())
    }

    pub fn current_batch(&self) -> Option<Batch> {
        self.coordinator().current().cloned()
    }

    pub fn shortlist(&self) -> Vec<MatchScore> {
        self.coordinator().shortlist().to_vec()
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.ledger.reservations()
    }

    /// Commits an exclusive reservation and withdraws the candidate from competing shortlists.
    ///
    /// A reservation held for another role is reported as a conflict; nothing is overridden.
    /// Approving the pair that is already reserved returns the held reservation and records
    /// nothing new. In-memory state is only kept once the repository accepts the write.
    pub fn approve(&self, request: ApprovalRequest) -> Result<Reservation, AllocationServiceError> {
        if let Some(rating) = request.rating {
            if !(1..=5).contains(&rating) {
                return Err(AllocationServiceError::InvalidRating(rating));
            }
        }

        let snapshot = self.repository.load()?;
        if snapshot.candidate(&request.candidate_id).is_none() {
            return Err(AllocationServiceError::CandidateNotFound(request.candidate_id));
        }
        if snapshot.role(&request.role_id).is_none() {
            return Err(AllocationServiceError::RoleNotFound(request.role_id));
        }

        let actor = self.actor_or_default(request.actor);
        let mut coordinator = self.coordinator();
        let held = self
            .ledger
            .reservation_for(&request.candidate_id)
            .filter(|existing| existing.role_id == request.role_id);
        if let Some(existing) = held {
            drop(coordinator);
            info!(
                candidate_id = %existing.candidate_id,
                role_id = %existing.role_id,
                "reservation already held"
            );
            return Ok(existing);
        }

        let now = Utc::now();
        let committed = self
            .ledger
            .commit(&request.candidate_id, &request.role_id, &actor, now);
        let reservation = match committed {
            Ok(reservation) => reservation,
            Err(conflict) => {
                drop(coordinator);
                warn!(
                    candidate_id = %conflict.candidate_id,
                    existing_role_id = %conflict.existing_role_id,
                    requested_role_id = %conflict.requested_role_id,
                    "reservation conflict"
                );
                self.events.publish(AllocationEvent::ReservationConflict {
                    candidate_id: conflict.candidate_id.clone(),
                    existing_role_id: conflict.existing_role_id.clone(),
                    requested_role_id: conflict.requested_role_id.clone(),
                })?;
                return Err(conflict.into());
            }
        };

        let mut staged = coordinator.clone();
        let withdrawn = staged.withdraw_candidate(&request.candidate_id, &request.role_id);
        let feedback = request.rating.map(|rating| ApprovalFeedback {
            candidate_id: request.candidate_id.clone(),
            role_id: request.role_id.clone(),
            rating,
            comment: request.comment.clone(),
            approved_at: now,
            approved_by: actor.clone(),
        });
        let persisted = self.persist(&staged, |snapshot| {
            snapshot.approvals.extend(feedback);
        });
        if let Err(error) = persisted {
            self.ledger.release(&reservation.candidate_id, &reservation.role_id);
            return Err(error);
        }
        *coordinator = staged;
        drop(coordinator);

        info!(
            candidate_id = %reservation.candidate_id,
            role_id = %reservation.role_id,
            actor = %reservation.reserved_by,
            withdrawn,
            "candidate reserved"
        );
        self.events.publish(AllocationEvent::CandidateReserved {
            candidate_id: reservation.candidate_id.clone(),
            role_id: reservation.role_id.clone(),
            actor: reservation.reserved_by.clone(),
            withdrawn,
        })?;
        Ok(reservation)
    }

    /// Releases a reservation. Releasing a pair that is not reserved changes nothing.
    pub fn release(
        &self,
        candidate_id: &CandidateId,
        role_id: &RoleId,
    ) -> Result<Option<Reservation>, AllocationServiceError> {
        let coordinator = self.coordinator();
        let Some(released) = self.ledger.release(candidate_id, role_id) else {
            return Ok(None);
        };
        if let Err(error) = self.persist(&coordinator, |_| {}) {
            let restored = self.ledger.commit(
                &released.candidate_id,
                &released.role_id,
                &released.reserved_by,
                released.reserved_at,
            );
            if let Err(conflict) = restored {
                warn!(%conflict, "released reservation could not be restored");
            }
            return Err(error);
        }
        drop(coordinator);

        info!(%candidate_id, %role_id, "reservation released");
        self.events.publish(AllocationEvent::ReservationReleased {
            candidate_id: candidate_id.clone(),
            role_id: role_id.clone(),
        })?;
        Ok(Some(released))
    }

    /// Records a manager rejection for analytics; the shortlist itself is left untouched.
    pub fn reject(&self, request: RejectionRequest) -> Result<Rejection, AllocationServiceError> {
        let rejection = Rejection {
            candidate_id: request.candidate_id,
            role_id: request.role_id,
            reason: request.reason,
            rejected_at: Utc::now(),
            rejected_by: self.actor_or_default(request.actor),
        };

        let coordinator = self.coordinator();
        let recorded = rejection.clone();
        self.persist(&coordinator, move |snapshot| snapshot.rejections.push(recorded))?;
        drop(coordinator);

        info!(
            candidate_id = %rejection.candidate_id,
            role_id = %rejection.role_id,
            "candidate rejected"
        );
        self.events.publish(AllocationEvent::CandidateRejected {
            candidate_id: rejection.candidate_id.clone(),
            role_id: rejection.role_id.clone(),
            reason: rejection.reason.clone(),
        })?;
        Ok(rejection)
    }

    /// Per-role view of the current batch's remaining shortlist, best matches first.
    pub fn approval_queue(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<RoleShortlist>, AllocationServiceError> {
        let snapshot = self.repository.load()?;
        let coordinator = self.coordinator();
        let Some(batch) = coordinator.current() else {
            return Ok(Vec::new());
        };

        let queue = batch
            .role_ids()
            .into_iter()
            .map(|role_id| {
                let mut matches: Vec<MatchScore> = coordinator
                    .shortlist()
                    .iter()
                    .filter(|entry| entry.role_id == role_id && entry.passed_constraints)
                    .cloned()
                    .collect();
                matches.sort_by(|left, right| right.total_score.cmp(&left.total_score));
                matches.truncate(APPROVAL_QUEUE_DEPTH);

                let role = snapshot.role(&role_id);
                RoleShortlist {
                    title: role
                        .map(|role| role.title.clone())
                        .unwrap_or_else(|| role_id.0.clone()),
                    start_preference: role.map(|role| role.start_preference),
                    start_buffer_violation: role.is_some_and(|role| {
                        role.inside_start_buffer(today, self.settings.start_buffer_days)
                    }),
                    role_id,
                    matches,
                }
            })
            .collect();

        Ok(queue)
    }
}

/// Error raised by the allocation service.
#[derive(Debug, thiserror::Error)]
pub enum AllocationServiceError {
    #[error("candidate {0} not found")]
    CandidateNotFound(CandidateId),
    #[error("role {0} not found")]
    RoleNotFound(RoleId),
    #[error("approval rating must be between 1 and 5 (found {0})")]
    InvalidRating(u8),
    #[error(transparent)]
    Conflict(#[from] ReservationConflict),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    RoleConfiguration(#[from] RoleConfigurationError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

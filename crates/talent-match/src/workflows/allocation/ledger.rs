use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CandidateId, RoleId};

/// Committed, exclusive assignment of a candidate to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub candidate_id: CandidateId,
    pub role_id: RoleId,
    pub reserved_at: DateTime<Utc>,
    pub reserved_by: String,
}

/// Raised when a candidate already holds a reservation for another role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("candidate {candidate_id} is already reserved for role {existing_role_id}")]
pub struct ReservationConflict {
    pub candidate_id: CandidateId,
    pub existing_role_id: RoleId,
    pub requested_role_id: RoleId,
}

/// Active reservations keyed by candidate, so a candidate can hold at most one.
///
/// `commit` runs its check and insert under a single lock; two concurrent commits for the same
/// candidate against different roles cannot both succeed.
#[derive(Debug, Default)]
pub struct ReservationLedger {
    active: Mutex<BTreeMap<CandidateId, Reservation>>,
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from persisted reservations, refusing data that breaks exclusivity.
    pub fn restore(
        reservations: impl IntoIterator<Item = Reservation>,
    ) -> Result<Self, ReservationConflict> {
        let mut active: BTreeMap<CandidateId, Reservation> = BTreeMap::new();
        for reservation in reservations {
            if let Some(existing) = active.get(&reservation.candidate_id) {
                if existing.role_id != reservation.role_id {
                    return Err(ReservationConflict {
                        candidate_id: reservation.candidate_id,
                        existing_role_id: existing.role_id.clone(),
                        requested_role_id: reservation.role_id,
                    });
                }
                continue;
            }
            active.insert(reservation.candidate_id.clone(), reservation);
        }

        Ok(Self {
            active: Mutex::new(active),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<CandidateId, Reservation>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserves `candidate_id` for `role_id`.
    ///
    /// Recommitting the pair that is already reserved returns the existing reservation
    /// unchanged. A reservation for a different role is never overridden; callers must
    /// `release` it first.
    pub fn commit(
        &self,
        candidate_id: &CandidateId,
        role_id: &RoleId,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReservationConflict> {
        let mut active = self.lock();

        if let Some(existing) = active.get(candidate_id) {
            if &existing.role_id == role_id {
                return Ok(existing.clone());
            }
            return Err(ReservationConflict {
                candidate_id: candidate_id.clone(),
                existing_role_id: existing.role_id.clone(),
                requested_role_id: role_id.clone(),
            });
        }

        let reservation = Reservation {
            candidate_id: candidate_id.clone(),
            role_id: role_id.clone(),
            reserved_at: now,
            reserved_by: actor.to_string(),
        };
        active.insert(candidate_id.clone(), reservation.clone());
        Ok(reservation)
    }

    /// Removes the reservation for the pair if present. Absent pairs are a no-op.
    pub fn release(&self, candidate_id: &CandidateId, role_id: &RoleId) -> Option<Reservation> {
        let mut active = self.lock();
        let held = active
            .get(candidate_id)
            .is_some_and(|existing| &existing.role_id == role_id);
        if held {
            active.remove(candidate_id)
        } else {
            None
        }
    }

    pub fn reservation_for(&self, candidate_id: &CandidateId) -> Option<Reservation> {
        self.lock().get(candidate_id).cloned()
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.lock().values().cloned().collect()
    }
}

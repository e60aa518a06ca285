use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::allocation::domain::{
    Candidate, CandidateId, CandidateOrigin, HardConstraints, InternalHistory, Interview,
    LanguageLevel, LanguageRequirement, LanguageSkill, PanelScores, Role, RoleId, ScoringWeights,
    SourcingStrategy, WorkModel,
};
use crate::workflows::allocation::repository::{
    AllocationEvent, AllocationRepository, AllocationSnapshot, EventPublisher, PublishError,
    RepositoryError,
};
use crate::workflows::allocation::{allocation_router, AllocationService, AllocationSettings};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn candidate_id(value: &str) -> CandidateId {
    CandidateId(value.to_string())
}

pub(super) fn role_id(value: &str) -> RoleId {
    RoleId(value.to_string())
}

pub(super) fn english(level: LanguageLevel) -> LanguageSkill {
    LanguageSkill {
        code: "en".to_string(),
        level,
    }
}

/// External analyst: strong on SQL/Python, one of the two key tools, retail background.
pub(super) fn candidate(id: &str, name: &str) -> Candidate {
    Candidate {
        id: candidate_id(id),
        name: name.to_string(),
        origin: CandidateOrigin::External,
        country: "DE".to_string(),
        time_zone: "Europe/Berlin".to_string(),
        languages: vec![english(LanguageLevel::C1)],
        experience_years_total: 6.0,
        experience_domains: vec!["retail".to_string()],
        skills: vec!["sql".to_string(), "python".to_string(), "ml".to_string()],
        tools: vec!["tableau".to_string()],
        internal_history: None,
        availability_date: date(2025, 11, 1),
        notes: String::new(),
    }
}

pub(super) fn internal_candidate(id: &str, name: &str) -> Candidate {
    Candidate {
        origin: CandidateOrigin::Internal,
        internal_history: Some(InternalHistory {
            function: "Analytics".to_string(),
            tenure_months: 24,
            last_business_unit: "BI Reporting".to_string(),
        }),
        ..candidate(id, name)
    }
}

pub(super) fn engineer(id: &str, name: &str) -> Candidate {
    Candidate {
        experience_years_total: 8.0,
        experience_domains: vec!["cloud".to_string()],
        skills: vec!["rust".to_string(), "sql".to_string()],
        tools: vec!["docker".to_string()],
        ..candidate(id, name)
    }
}

pub(super) fn role(id: &str) -> Role {
    Role {
        id: role_id(id),
        title: "Data Analyst".to_string(),
        function: "Analytics".to_string(),
        subfunction: "BI".to_string(),
        country: "DE".to_string(),
        work_model: WorkModel::Hybrid,
        start_preference: date(2025, 12, 1),
        reporting_line: "Head of Analytics".to_string(),
        target_levels: vec!["L3".to_string()],
        sourcing_strategy: SourcingStrategy::Open,
        languages_required: vec![LanguageRequirement {
            code: "en".to_string(),
            min: LanguageLevel::B2,
        }],
        leveling_must_haves: vec!["sql".to_string(), "python".to_string()],
        preferred_skills: vec!["dashboards".to_string()],
        tools_top5: vec!["tableau".to_string(), "dbt".to_string()],
        experience_domains: vec!["retail".to_string()],
        hard_constraints: HardConstraints::default(),
        weights: ScoringWeights::default(),
        age_days: 10,
        manager: Some("Grace".to_string()),
        ta_responsible: None,
    }
}

pub(super) fn platform_role(id: &str) -> Role {
    Role {
        title: "Platform Engineer".to_string(),
        function: "Engineering".to_string(),
        subfunction: "Platform".to_string(),
        start_preference: date(2026, 3, 1),
        leveling_must_haves: vec!["rust".to_string()],
        preferred_skills: vec!["sql".to_string()],
        tools_top5: vec!["docker".to_string()],
        experience_domains: vec!["cloud".to_string()],
        age_days: 30,
        ..role(id)
    }
}

pub(super) fn interview(candidate: &str, role: &str, scores: (f64, f64, f64)) -> Interview {
    Interview {
        candidate_id: candidate_id(candidate),
        role_id: role_id(role),
        panel_scores: PanelScores {
            technical: scores.0,
            communication: scores.1,
            business: scores.2,
        },
        notes: String::new(),
    }
}

/// Two roles, two eligible candidates, and one who fails the English gate.
pub(super) fn seeded_snapshot() -> AllocationSnapshot {
    let mut weak_english = candidate("c-cem", "Cem");
    weak_english.languages = vec![english(LanguageLevel::A2)];

    AllocationSnapshot {
        candidates: vec![
            candidate("c-ada", "Ada"),
            engineer("c-bob", "Bob"),
            weak_english,
        ],
        roles: vec![role("role-analyst"), platform_role("role-platform")],
        ..AllocationSnapshot::default()
    }
}

pub(super) fn build_service() -> (
    AllocationService<MemoryRepository, MemoryEvents>,
    Arc<MemoryRepository>,
    Arc<MemoryEvents>,
) {
    build_service_with(seeded_snapshot())
}

pub(super) fn build_service_with(
    snapshot: AllocationSnapshot,
) -> (
    AllocationService<MemoryRepository, MemoryEvents>,
    Arc<MemoryRepository>,
    Arc<MemoryEvents>,
) {
    let repository = Arc::new(MemoryRepository::seeded(snapshot));
    let events = Arc::new(MemoryEvents::default());
    let service = AllocationService::new(
        repository.clone(),
        events.clone(),
        AllocationSettings::default(),
    )
    .expect("service restores from memory");
    (service, repository, events)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    state: Arc<Mutex<AllocationSnapshot>>,
}

impl MemoryRepository {
    pub(super) fn seeded(snapshot: AllocationSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
        }
    }

    pub(super) fn snapshot(&self) -> AllocationSnapshot {
        self.state.lock().expect("repository mutex poisoned").clone()
    }
}

impl AllocationRepository for MemoryRepository {
    fn load(&self) -> Result<AllocationSnapshot, RepositoryError> {
        Ok(self.snapshot())
    }

    fn save(&self, snapshot: &AllocationSnapshot) -> Result<(), RepositoryError> {
        *self.state.lock().expect("repository mutex poisoned") = snapshot.clone();
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryEvents {
    events: Arc<Mutex<Vec<AllocationEvent>>>,
}

impl MemoryEvents {
    pub(super) fn events(&self) -> Vec<AllocationEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }

    pub(super) fn labels(&self) -> Vec<&'static str> {
        self.events().iter().map(AllocationEvent::label).collect()
    }
}

impl EventPublisher for MemoryEvents {
    fn publish(&self, event: AllocationEvent) -> Result<(), PublishError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

/// Serves reads from a fixed snapshot and refuses every write.
pub(super) struct ReadOnlyRepository {
    pub(super) snapshot: AllocationSnapshot,
}

impl AllocationRepository for ReadOnlyRepository {
    fn load(&self) -> Result<AllocationSnapshot, RepositoryError> {
        Ok(self.snapshot.clone())
    }

    fn save(&self, _snapshot: &AllocationSnapshot) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }
}

/// Memory store whose writes can be switched off mid-test.
pub(super) struct SwitchableRepository {
    pub(super) inner: MemoryRepository,
    refuse_writes: AtomicBool,
}

impl SwitchableRepository {
    pub(super) fn seeded(snapshot: AllocationSnapshot) -> Self {
        Self {
            inner: MemoryRepository::seeded(snapshot),
            refuse_writes: AtomicBool::new(false),
        }
    }

    pub(super) fn refuse_writes(&self) {
        self.refuse_writes.store(true, Ordering::SeqCst);
    }
}

impl AllocationRepository for SwitchableRepository {
    fn load(&self) -> Result<AllocationSnapshot, RepositoryError> {
        self.inner.load()
    }

    fn save(&self, snapshot: &AllocationSnapshot) -> Result<(), RepositoryError> {
        if self.refuse_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("disk full".to_string()));
        }
        self.inner.save(snapshot)
    }
}

pub(super) struct UnavailableRepository;

impl AllocationRepository for UnavailableRepository {
    fn load(&self) -> Result<AllocationSnapshot, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn save(&self, _snapshot: &AllocationSnapshot) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

pub(super) fn router_with_service(
    service: AllocationService<MemoryRepository, MemoryEvents>,
) -> axum::Router {
    allocation_router(Arc::new(service))
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).expect("json payload")
}

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use talent_match::workflows::allocation::{
    AllocationEvent, AllocationRepository, AllocationSnapshot, EventPublisher, PublishError,
    RepositoryError,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAllocationRepository {
    state: Arc<Mutex<AllocationSnapshot>>,
}

impl InMemoryAllocationRepository {
    pub(crate) fn seeded(snapshot: AllocationSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
        }
    }
}

impl AllocationRepository for InMemoryAllocationRepository {
    fn load(&self) -> Result<AllocationSnapshot, RepositoryError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &AllocationSnapshot) -> Result<(), RepositoryError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))?;
        *guard = snapshot.clone();
        Ok(())
    }
}

/// Snapshot persisted as a single pretty-printed JSON document.
///
/// A missing or blank file loads as an empty snapshot.
pub(crate) struct JsonFileRepository {
    path: PathBuf,
    writes: Mutex<()>,
}

impl JsonFileRepository {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: Mutex::new(()),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl AllocationRepository for JsonFileRepository {
    fn load(&self) -> Result<AllocationSnapshot, RepositoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(AllocationSnapshot::default())
            }
            Err(err) => {
                return Err(RepositoryError::Unavailable(format!(
                    "{}: {err}",
                    self.path.display()
                )))
            }
        };

        if raw.trim().is_empty() {
            return Ok(AllocationSnapshot::default());
        }

        serde_json::from_str(&raw)
            .map_err(|err| RepositoryError::Corrupt(format!("{}: {err}", self.path.display())))
    }

    fn save(&self, snapshot: &AllocationSnapshot) -> Result<(), RepositoryError> {
        let body = serde_json::to_string_pretty(snapshot)
            .map_err(|err| RepositoryError::Corrupt(err.to_string()))?;

        let _guard = self
            .writes
            .lock()
            .map_err(|_| RepositoryError::Unavailable("file writer poisoned".to_string()))?;
        fs::write(&self.path, body).map_err(|err| {
            RepositoryError::Unavailable(format!("{}: {err}", self.path.display()))
        })
    }
}

/// Storage chosen at startup: a JSON file when a data path is configured, memory otherwise.
pub(crate) enum AllocationStore {
    Memory(InMemoryAllocationRepository),
    File(JsonFileRepository),
}

impl AllocationStore {
    pub(crate) fn open(data_path: Option<&Path>, seed: impl FnOnce() -> AllocationSnapshot) -> Self {
        match data_path {
            Some(path) => Self::File(JsonFileRepository::new(path)),
            None => Self::Memory(InMemoryAllocationRepository::seeded(seed())),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            AllocationStore::Memory(_) => "in-memory".to_string(),
            AllocationStore::File(repository) => repository.path().display().to_string(),
        }
    }
}

impl AllocationRepository for AllocationStore {
    fn load(&self) -> Result<AllocationSnapshot, RepositoryError> {
        match self {
            AllocationStore::Memory(repository) => repository.load(),
            AllocationStore::File(repository) => repository.load(),
        }
    }

    fn save(&self, snapshot: &AllocationSnapshot) -> Result<(), RepositoryError> {
        match self {
            AllocationStore::Memory(repository) => repository.save(snapshot),
            AllocationStore::File(repository) => repository.save(snapshot),
        }
    }
}

/// Emits every allocation event as a structured `tracing` record.
#[derive(Default, Clone, Copy)]
pub(crate) struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, event: AllocationEvent) -> Result<(), PublishError> {
        let payload =
            serde_json::to_string(&event).map_err(|err| PublishError::Transport(err.to_string()))?;
        info!(kind = event.label(), %payload, "allocation event");
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEventPublisher {
    events: Arc<Mutex<Vec<AllocationEvent>>>,
}

impl EventPublisher for InMemoryEventPublisher {
    fn publish(&self, event: AllocationEvent) -> Result<(), PublishError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| PublishError::Transport("event buffer poisoned".to_string()))?;
        guard.push(event);
        Ok(())
    }
}

impl InMemoryEventPublisher {
    pub(crate) fn events(&self) -> Vec<AllocationEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};
    use talent_match::workflows::allocation::{BatchId, CandidateId, RoleId};

    fn scratch_file(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "talent-match-{label}-{}-{nanos}.json",
            std::process::id()
        ))
    }

    #[test]
    fn json_repository_treats_missing_file_as_empty() {
        let repository = JsonFileRepository::new(scratch_file("missing"));
        let snapshot = repository.load().expect("missing file loads");
        assert_eq!(snapshot, AllocationSnapshot::default());
    }

    #[test]
    fn json_repository_persists_pretty_snapshots() {
        let path = scratch_file("persist");
        let repository = JsonFileRepository::new(&path);

        let snapshot = AllocationSnapshot {
            current_batch: Some(BatchId("batch-1-001".to_string())),
            ..AllocationSnapshot::default()
        };
        repository.save(&snapshot).expect("snapshot saves");

        let raw = fs::read_to_string(&path).expect("file written");
        assert!(raw.contains("\n  \"candidates\": []"));
        assert_eq!(repository.load().expect("snapshot loads"), snapshot);

        fs::remove_file(&path).expect("cleanup");
    }

    #[test]
    fn json_repository_reports_corrupt_documents() {
        let path = scratch_file("corrupt");
        fs::write(&path, "{ not json").expect("fixture written");

        let result = JsonFileRepository::new(&path).load();
        assert!(matches!(result, Err(RepositoryError::Corrupt(_))));

        fs::remove_file(&path).expect("cleanup");
    }

    #[test]
    fn in_memory_publisher_keeps_event_order() {
        let publisher = InMemoryEventPublisher::default();
        publisher
            .publish(AllocationEvent::ReservationReleased {
                candidate_id: CandidateId("c-1".to_string()),
                role_id: RoleId("r-1".to_string()),
            })
            .expect("publish succeeds");
        TracingEventPublisher
            .publish(AllocationEvent::BatchSent {
                batch_id: BatchId("batch-1-001".to_string()),
            })
            .expect("tracing publish succeeds");

        let labels: Vec<&str> = publisher.events().iter().map(AllocationEvent::label).collect();
        assert_eq!(labels, vec!["reservation_released"]);
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert_eq!(
            parse_date(" 2025-11-03 "),
            Ok(NaiveDate::from_ymd_opt(2025, 11, 3).expect("valid"))
        );
        assert!(parse_date("03/11/2025").is_err());
    }
}

use chrono::{TimeZone, Utc};

use super::common::*;
use crate::workflows::allocation::{score, BatchCoordinator, BatchError, BatchId, MatchScore};

fn at(hour: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn sample_matches() -> Vec<MatchScore> {
    let analyst = role("role-analyst");
    let platform = platform_role("role-platform");
    let ada = candidate("c-ada", "Ada");
    let bob = engineer("c-bob", "Bob");

    vec![
        score(&ada, &analyst, None),
        score(&bob, &analyst, None),
        score(&bob, &platform, None),
        score(&ada, &platform, None),
    ]
}

#[test]
fn create_batch_becomes_current_and_seeds_shortlist() {
    let mut coordinator = BatchCoordinator::new();
    let batch = coordinator.create_batch(sample_matches(), at(9));

    assert!(batch.id.0.starts_with("batch-"));
    assert!(batch.id.0.ends_with("-001"));
    assert!(!batch.is_sent());
    assert_eq!(coordinator.current_id(), Some(&batch.id));
    assert_eq!(coordinator.shortlist(), batch.matches.as_slice());
    assert_eq!(
        batch.role_ids(),
        vec![role_id("role-analyst"), role_id("role-platform")]
    );
}

#[test]
fn later_batches_replace_the_current_one() {
    let mut coordinator = BatchCoordinator::new();
    let first = coordinator.create_batch(sample_matches(), at(9));
    let second = coordinator.create_batch(Vec::new(), at(9));

    assert_ne!(first.id, second.id);
    assert_eq!(coordinator.current_id(), Some(&second.id));
    assert!(coordinator.shortlist().is_empty());
    assert_eq!(coordinator.batches().len(), 2);
    assert!(coordinator.get(&first.id).is_some());
}

#[test]
fn sending_stamps_once() {
    let mut coordinator = BatchCoordinator::new();
    let batch = coordinator.create_batch(sample_matches(), at(9));

    let sent = coordinator
        .send_batch(&batch.id, at(10))
        .expect("batch exists");
    assert_eq!(sent.sent_at, Some(at(10)));

    let resent = coordinator
        .send_batch(&batch.id, at(15))
        .expect("batch exists");
    assert_eq!(resent.sent_at, Some(at(10)));
    assert_eq!(resent.matches, batch.matches);
}

#[test]
fn sending_unknown_batch_fails() {
    let mut coordinator = BatchCoordinator::new();
    let missing = BatchId("batch-0-001".to_string());

    assert_eq!(
        coordinator.send_batch(&missing, at(9)),
        Err(BatchError::NotFound(missing.clone()))
    );
}

#[test]
fn withdraw_drops_competing_entries_only_from_shortlist() {
    let mut coordinator = BatchCoordinator::new();
    let batch = coordinator.create_batch(sample_matches(), at(9));

    let removed = coordinator.withdraw_candidate(&candidate_id("c-ada"), &role_id("role-analyst"));
    assert_eq!(removed, 1);
    assert_eq!(coordinator.shortlist().len(), 3);
    assert!(coordinator
        .shortlist()
        .iter()
        .all(|entry| !entry.concerns(&candidate_id("c-ada"), &role_id("role-platform"))));
    assert_eq!(
        coordinator.current().map(|current| current.matches.len()),
        Some(batch.matches.len())
    );
}

#[test]
fn restore_ignores_unknown_current_batch() {
    let mut original = BatchCoordinator::new();
    let batch = original.create_batch(sample_matches(), at(9));

    let orphaned = BatchCoordinator::restore(
        vec![batch.clone()],
        Some(BatchId("batch-missing".to_string())),
        None,
    );
    assert!(orphaned.current().is_none());
    assert!(orphaned.shortlist().is_empty());

    let rebuilt = BatchCoordinator::restore(vec![batch.clone()], Some(batch.id.clone()), None);
    assert_eq!(rebuilt.shortlist(), batch.matches.as_slice());

    let mut next = rebuilt;
    let following = next.create_batch(Vec::new(), at(11));
    assert!(following.id.0.ends_with("-002"));
}

use std::cmp::Ordering;

use super::domain::{Candidate, Interview, MatchScore, PipelineEntry, Role};
use super::scoring::MatchEngine;

pub const DEFAULT_LIMIT: usize = 3;

fn interview_for<'a>(
    interviews: &'a [Interview],
    candidate: &Candidate,
    role: &Role,
) -> Option<&'a Interview> {
    interviews
        .iter()
        .find(|interview| interview.candidate_id == candidate.id && interview.role_id == role.id)
}

fn pipeline_for<'a>(
    pipeline: &'a [PipelineEntry],
    candidate: &Candidate,
    role: &Role,
) -> Option<&'a PipelineEntry> {
    pipeline
        .iter()
        .find(|entry| entry.applies_to(&candidate.id, &role.id))
}

/// Ranks the candidate pool for one role.
///
/// Ties on total score go to the candidate who has waited longest in the pipeline, then to the
/// lower candidate id, so the output never depends on input order.
pub fn top_matches_for_role(
    engine: &MatchEngine,
    role: &Role,
    candidates: &[Candidate],
    interviews: &[Interview],
    pipeline: &[PipelineEntry],
    limit: usize,
) -> Vec<MatchScore> {
    let mut ranked: Vec<(MatchScore, u32)> = candidates
        .iter()
        .filter_map(|candidate| {
            let interview = interview_for(interviews, candidate, role);
            let waited = pipeline_for(pipeline, candidate, role)
                .map(|entry| entry.time_in_pipe_days)
                .unwrap_or(0);
            let score = engine.score(candidate, role, interview);
            score.passed_constraints.then_some((score, waited))
        })
        .collect();

    ranked.sort_by(|(left, left_waited), (right, right_waited)| {
        by_score(left, right)
            .then_with(|| right_waited.cmp(left_waited))
            .then_with(|| left.candidate_id.cmp(&right.candidate_id))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(score, _)| score)
        .collect()
}

/// Ranks open roles for one candidate. Ties go to the older role, then to the lower role id.
pub fn top_matches_for_candidate(
    engine: &MatchEngine,
    candidate: &Candidate,
    roles: &[Role],
    interviews: &[Interview],
    limit: usize,
) -> Vec<MatchScore> {
    let mut ranked: Vec<(MatchScore, u32)> = roles
        .iter()
        .filter_map(|role| {
            let interview = interview_for(interviews, candidate, role);
            let score = engine.score(candidate, role, interview);
            score.passed_constraints.then_some((score, role.age_days))
        })
        .collect();

    ranked.sort_by(|(left, left_age), (right, right_age)| {
        by_score(left, right)
            .then_with(|| right_age.cmp(left_age))
            .then_with(|| left.role_id.cmp(&right.role_id))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(score, _)| score)
        .collect()
}

fn by_score(left: &MatchScore, right: &MatchScore) -> Ordering {
    right.total_score.cmp(&left.total_score)
}

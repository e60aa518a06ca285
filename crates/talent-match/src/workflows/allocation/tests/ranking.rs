use super::common::*;
use crate::workflows::allocation::domain::{
    LanguageLevel, PipelineEntry, PipelineStage, ScoringWeights,
};
use crate::workflows::allocation::{top_matches_for_candidate, top_matches_for_role, MatchEngine};

fn pipeline(candidate: &str, role: Option<&str>, days: u32) -> PipelineEntry {
    PipelineEntry {
        candidate_id: candidate_id(candidate),
        role_id: role.map(role_id),
        stage: PipelineStage::ManagerReview,
        entered_stage_at: date(2025, 9, 1),
        time_in_pipe_days: days,
    }
}

#[test]
fn role_ranking_orders_by_score_and_drops_failed_pairs() {
    let mut weak = candidate("c-cem", "Cem");
    weak.languages = vec![english(LanguageLevel::A2)];
    let candidates = vec![engineer("c-bob", "Bob"), weak, candidate("c-ada", "Ada")];

    let ranked = top_matches_for_role(
        &MatchEngine::default(),
        &role("role-analyst"),
        &candidates,
        &[],
        &[],
        3,
    );

    let ids: Vec<&str> = ranked
        .iter()
        .map(|entry| entry.candidate_id.0.as_str())
        .collect();
    assert_eq!(ids, vec!["c-ada", "c-bob"]);
    assert!(ranked
        .windows(2)
        .all(|pair| pair[0].total_score >= pair[1].total_score));
}

#[test]
fn role_ranking_respects_limit() {
    let candidates = vec![candidate("c-ada", "Ada"), engineer("c-bob", "Bob")];
    let engine = MatchEngine::default();
    let role = role("role-analyst");

    let ranked = top_matches_for_role(&engine, &role, &candidates, &[], &[], 1);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].candidate_id, candidate_id("c-ada"));

    assert!(top_matches_for_role(&engine, &role, &candidates, &[], &[], 0).is_empty());
}

#[test]
fn limit_two_keeps_the_leader_and_the_longer_waiting_runner_up() {
    let must_haves: Vec<String> = (1..=20).map(|index| format!("skill-{index:02}")).collect();
    let mut role = role("role-analyst");
    role.leveling_must_haves = must_haves.clone();
    role.weights = ScoringWeights {
        leveling: 1.0,
        function_skills: 0.0,
        tools: 0.0,
        background_fit: 0.0,
    };
    let covering = |id: &str, covered: usize| {
        let mut candidate = candidate(id, "Pool");
        candidate.skills = must_haves[..covered].to_vec();
        candidate
    };
    let candidates = vec![
        covering("c-a", 15),
        covering("c-top", 18),
        covering("c-b", 15),
    ];
    let waiting = vec![pipeline("c-a", None, 5), pipeline("c-b", None, 40)];

    let ranked = top_matches_for_role(
        &MatchEngine::default(),
        &role,
        &candidates,
        &[],
        &waiting,
        2,
    );

    let picked: Vec<(&str, u32)> = ranked
        .iter()
        .map(|entry| (entry.candidate_id.0.as_str(), entry.total_score))
        .collect();
    assert_eq!(picked, vec![("c-top", 90), ("c-b", 75)]);
}

#[test]
fn equal_scores_favour_longest_waiting_candidate() {
    let candidates = vec![candidate("c-a", "Twin"), candidate("c-b", "Twin")];
    let engine = MatchEngine::default();
    let role = role("role-analyst");

    let without_pipeline = top_matches_for_role(&engine, &role, &candidates, &[], &[], 3);
    assert_eq!(without_pipeline[0].candidate_id, candidate_id("c-a"));
    assert_eq!(
        without_pipeline[0].total_score,
        without_pipeline[1].total_score
    );

    let entries = vec![
        pipeline("c-a", Some("role-platform"), 90),
        pipeline("c-b", Some("role-analyst"), 20),
    ];
    let with_pipeline = top_matches_for_role(&engine, &role, &candidates, &[], &entries, 3);
    assert_eq!(with_pipeline[0].candidate_id, candidate_id("c-b"));

    let roleless = vec![pipeline("c-a", None, 45), pipeline("c-b", Some("role-analyst"), 20)];
    let with_roleless = top_matches_for_role(&engine, &role, &candidates, &[], &roleless, 3);
    assert_eq!(with_roleless[0].candidate_id, candidate_id("c-a"));
}

#[test]
fn interviews_are_applied_per_pair() {
    let candidates = vec![candidate("c-a", "Twin"), candidate("c-b", "Twin")];
    let mut role = role("role-analyst");
    role.leveling_must_haves = vec!["sql".to_string(), "stakeholder management".to_string()];
    let interviews = vec![interview("c-b", "role-analyst", (4.5, 4.5, 4.5))];

    let ranked = top_matches_for_role(
        &MatchEngine::default(),
        &role,
        &candidates,
        &interviews,
        &[],
        3,
    );
    assert_eq!(ranked[0].candidate_id, candidate_id("c-b"));
    assert!(ranked[0].total_score > ranked[1].total_score);
}

#[test]
fn candidate_ranking_orders_roles_and_breaks_ties_on_age() {
    let ada = candidate("c-ada", "Ada");
    let engine = MatchEngine::default();

    let mut fresh = role("role-x");
    fresh.age_days = 5;
    let mut stale = role("role-y");
    stale.age_days = 40;
    let roles = vec![platform_role("role-platform"), fresh, stale];

    let ranked = top_matches_for_candidate(&engine, &ada, &roles, &[], 3);
    let ids: Vec<&str> = ranked.iter().map(|entry| entry.role_id.0.as_str()).collect();
    assert_eq!(ids, vec!["role-y", "role-x", "role-platform"]);

    let same_age = vec![role("role-b"), role("role-a")];
    let ranked = top_matches_for_candidate(&engine, &ada, &same_age, &[], 3);
    assert_eq!(ranked[0].role_id, role_id("role-a"));
}

#[test]
fn candidate_ranking_skips_roles_that_fail_constraints() {
    let mut german_only = role("role-de");
    german_only.languages_required[0].code = "de".to_string();
    let roles = vec![german_only, role("role-analyst")];

    let ranked = top_matches_for_candidate(
        &MatchEngine::default(),
        &candidate("c-ada", "Ada"),
        &roles,
        &[],
        3,
    );
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].role_id, role_id("role-analyst"));
}

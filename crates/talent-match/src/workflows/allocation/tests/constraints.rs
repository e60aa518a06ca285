use super::common::*;
use crate::workflows::allocation::constraints::{evaluate, ConstraintViolation};
use crate::workflows::allocation::domain::{
    LanguageLevel, LanguageRequirement, ScoreBreakdown, WorkModel,
};
use crate::workflows::allocation::score;

#[test]
fn missing_language_blocks_the_pair() {
    let mut role = role("role-analyst");
    role.languages_required.push(LanguageRequirement {
        code: "de".to_string(),
        min: LanguageLevel::B1,
    });
    let candidate = candidate("c-ada", "Ada");

    let report = evaluate(&candidate, &role);
    assert!(!report.passed());
    assert_eq!(
        report.violations,
        vec![ConstraintViolation::MissingLanguage {
            code: "de".to_string()
        }]
    );

    let result = score(&candidate, &role, None);
    assert!(!result.passed_constraints);
    assert_eq!(result.total_score, 0);
    assert_eq!(result.breakdown, ScoreBreakdown::default());
    assert!(result.evidence.is_empty());
    assert_eq!(
        result.constraint_violations,
        vec!["Missing required language: de".to_string()]
    );
}

#[test]
fn level_below_minimum_is_reported_with_both_levels() {
    let role = role("role-analyst");
    let mut candidate = candidate("c-ada", "Ada");
    candidate.languages = vec![english(LanguageLevel::B1)];

    let result = score(&candidate, &role, None);
    assert_eq!(
        result.constraint_violations,
        vec!["Language en: candidate has B1, required B2".to_string()]
    );
}

#[test]
fn higher_level_than_required_passes() {
    let role = role("role-analyst");
    let mut candidate = candidate("c-ada", "Ada");
    candidate.languages = vec![english(LanguageLevel::C2)];

    assert!(evaluate(&candidate, &role).passed());
}

#[test]
fn on_site_role_requires_matching_country() {
    let mut role = role("role-analyst");
    role.work_model = WorkModel::OnSite;
    let mut candidate = candidate("c-ada", "Ada");
    candidate.country = "PL".to_string();

    let result = score(&candidate, &role, None);
    assert!(!result.passed_constraints);
    assert_eq!(
        result.constraint_violations,
        vec!["On-site role requires candidate in DE, candidate is in PL".to_string()]
    );
}

#[test]
fn remote_and_hybrid_roles_ignore_country() {
    let mut candidate = candidate("c-ada", "Ada");
    candidate.country = "PL".to_string();

    for work_model in [WorkModel::Remote, WorkModel::Hybrid] {
        let mut role = role("role-analyst");
        role.work_model = work_model;
        assert!(evaluate(&candidate, &role).passed(), "{work_model:?}");
    }
}

#[test]
fn language_and_location_violations_accumulate_in_order() {
    let mut role = role("role-analyst");
    role.work_model = WorkModel::OnSite;
    role.hard_constraints.language_fluent = true;
    let mut candidate = candidate("c-ada", "Ada");
    candidate.country = "FR".to_string();
    candidate.languages.clear();

    let report = evaluate(&candidate, &role);
    assert_eq!(
        report.violations,
        vec![
            ConstraintViolation::MissingLanguage {
                code: "en".to_string()
            },
            ConstraintViolation::LocationMismatch {
                role_country: "DE".to_string(),
                candidate_country: "FR".to_string(),
            },
        ]
    );
}

#[test]
fn fluency_flag_alone_does_not_block_a_qualified_candidate() {
    let mut role = role("role-analyst");
    role.hard_constraints.language_fluent = true;

    let report = evaluate(&candidate("c-ada", "Ada"), &role);
    assert!(report.passed());
    assert!(report.violations.is_empty());
}

#[test]
fn language_failure_blocks_even_without_fluency_flag() {
    let mut role = role("role-analyst");
    role.hard_constraints.language_fluent = false;
    let mut candidate = candidate("c-ada", "Ada");
    candidate.languages = vec![english(LanguageLevel::A2)];

    assert!(!evaluate(&candidate, &role).passed());
    assert!(!score(&candidate, &role, None).passed_constraints);
}

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for candidates in the talent pool.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier wrapper for open roles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a candidate is already employed by the organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateOrigin {
    Internal,
    External,
}

/// CEFR proficiency scale; the derived ordering is `A1 < A2 < B1 < B2 < C1 < C2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl LanguageLevel {
    pub const fn label(self) -> &'static str {
        match self {
            LanguageLevel::A1 => "A1",
            LanguageLevel::A2 => "A2",
            LanguageLevel::B1 => "B1",
            LanguageLevel::B2 => "B2",
            LanguageLevel::C1 => "C1",
            LanguageLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Language spoken by a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub code: String,
    pub level: LanguageLevel,
}

/// Minimum proficiency a role expects for a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRequirement {
    pub code: String,
    pub min: LanguageLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkModel {
    Remote,
    Hybrid,
    #[serde(rename = "On-site")]
    OnSite,
}

/// Prior employment inside the organisation for internal candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalHistory {
    pub function: String,
    pub tenure_months: u32,
    #[serde(rename = "last_bu")]
    pub last_business_unit: String,
}

/// Talent pool entry. Treated as immutable by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    #[serde(rename = "type")]
    pub origin: CandidateOrigin,
    pub country: String,
    #[serde(default)]
    pub time_zone: String,
    pub languages: Vec<LanguageSkill>,
    pub experience_years_total: f64,
    #[serde(default)]
    pub experience_domains: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_history: Option<InternalHistory>,
    pub availability_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl Candidate {
    pub fn language(&self, code: &str) -> Option<&LanguageSkill> {
        self.languages.iter().find(|language| language.code == code)
    }

    pub fn is_internal(&self) -> bool {
        self.origin == CandidateOrigin::Internal
    }
}

/// How aggressively a role is sourced from the internal pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcingStrategy {
    InternalOnly,
    InternalFirst,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HardConstraints {
    pub language_fluent: bool,
}

/// Per-role multipliers for the four score components.
///
/// Expected to sum to 1.0 but the engine never enforces it; intake validation only rejects
/// negative, non-finite, or all-zero weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub leveling: f64,
    pub function_skills: f64,
    pub tools: f64,
    pub background_fit: f64,
}

impl ScoringWeights {
    pub fn values(&self) -> [f64; 4] {
        [
            self.leveling,
            self.function_skills,
            self.tools,
            self.background_fit,
        ]
    }

    pub fn total(&self) -> f64 {
        self.values().iter().sum()
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            leveling: 0.45,
            function_skills: 0.35,
            tools: 0.10,
            background_fit: 0.10,
        }
    }
}

/// Open position created at intake. Weights and must-haves form the scoring contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub title: String,
    pub function: String,
    pub subfunction: String,
    pub country: String,
    pub work_model: WorkModel,
    pub start_preference: NaiveDate,
    #[serde(default)]
    pub reporting_line: String,
    #[serde(default)]
    pub target_levels: Vec<String>,
    #[serde(rename = "internal_first_strategy")]
    pub sourcing_strategy: SourcingStrategy,
    #[serde(default)]
    pub languages_required: Vec<LanguageRequirement>,
    #[serde(default)]
    pub leveling_must_haves: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub tools_top5: Vec<String>,
    #[serde(default)]
    pub experience_domains: Vec<String>,
    #[serde(default)]
    pub hard_constraints: HardConstraints,
    pub weights: ScoringWeights,
    #[serde(default)]
    pub age_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ta_responsible: Option<String>,
}

pub const MAX_MUST_HAVES: usize = 5;
pub const MAX_KEY_TOOLS: usize = 5;

/// Intake errors for roles whose scoring contract is malformed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoleConfigurationError {
    #[error("role id must not be empty")]
    MissingId,
    #[error("weight '{component}' must be a finite, non-negative number (found {value})")]
    InvalidWeight { component: &'static str, value: f64 },
    #[error("at least one scoring weight must be positive")]
    ZeroWeights,
    #[error("role must list at least one leveling must-have")]
    NoMustHaves,
    #[error("role lists {found} leveling must-haves, at most 5 are allowed")]
    TooManyMustHaves { found: usize },
    #[error("role lists {found} key tools, at most 5 are allowed")]
    TooManyTools { found: usize },
}

impl Role {
    /// Intake check for the scoring contract. Scoring itself tolerates every case rejected here.
    pub fn validate(&self) -> Result<(), RoleConfigurationError> {
        if self.id.0.trim().is_empty() {
            return Err(RoleConfigurationError::MissingId);
        }

        let named = [
            ("leveling", self.weights.leveling),
            ("function_skills", self.weights.function_skills),
            ("tools", self.weights.tools),
            ("background_fit", self.weights.background_fit),
        ];
        for (component, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(RoleConfigurationError::InvalidWeight { component, value });
            }
        }
        if self.weights.total() <= 0.0 {
            return Err(RoleConfigurationError::ZeroWeights);
        }

        if self.leveling_must_haves.is_empty() {
            return Err(RoleConfigurationError::NoMustHaves);
        }
        if self.leveling_must_haves.len() > MAX_MUST_HAVES {
            return Err(RoleConfigurationError::TooManyMustHaves {
                found: self.leveling_must_haves.len(),
            });
        }
        if self.tools_top5.len() > MAX_KEY_TOOLS {
            return Err(RoleConfigurationError::TooManyTools {
                found: self.tools_top5.len(),
            });
        }

        Ok(())
    }

    /// True when the desired start date falls inside the notice buffer counted from `today`.
    pub fn inside_start_buffer(&self, today: NaiveDate, buffer_days: u32) -> bool {
        let earliest = today + chrono::Duration::days(i64::from(buffer_days));
        self.start_preference < earliest
    }
}

/// Panel results on a 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelScores {
    pub technical: f64,
    pub communication: f64,
    pub business: f64,
}

impl PanelScores {
    pub fn average(&self) -> f64 {
        (self.technical + self.communication + self.business) / 3.0
    }
}

/// Interview feedback for one candidate against one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub candidate_id: CandidateId,
    pub role_id: RoleId,
    pub panel_scores: PanelScores,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Screening,
    ManagerReview,
    Offer,
    Accepted,
}

/// Time-in-stage record. A missing role id means the entry applies to any role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEntry {
    pub candidate_id: CandidateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    pub stage: PipelineStage,
    pub entered_stage_at: NaiveDate,
    pub time_in_pipe_days: u32,
}

impl PipelineEntry {
    pub fn applies_to(&self, candidate_id: &CandidateId, role_id: &RoleId) -> bool {
        &self.candidate_id == candidate_id
            && self.role_id.as_ref().map_or(true, |role| role == role_id)
    }
}

/// Weighted contribution of each component, rounded to whole points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub leveling: u32,
    pub function_skills: u32,
    pub tools: u32,
    pub background_fit: u32,
}

/// Derived compatibility result for a (candidate, role) pair.
///
/// `passed_constraints` is true exactly when `constraint_violations` is empty. Failed pairs
/// carry a zero total, a zero breakdown, and no evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub candidate_id: CandidateId,
    pub role_id: RoleId,
    pub total_score: u32,
    pub breakdown: ScoreBreakdown,
    pub evidence: Vec<String>,
    pub passed_constraints: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraint_violations: Vec<String>,
}

impl MatchScore {
    pub(crate) fn rejected(
        candidate_id: CandidateId,
        role_id: RoleId,
        violations: Vec<String>,
    ) -> Self {
        Self {
            candidate_id,
            role_id,
            total_score: 0,
            breakdown: ScoreBreakdown::default(),
            evidence: Vec::new(),
            passed_constraints: false,
            constraint_violations: violations,
        }
    }

    pub fn concerns(&self, candidate_id: &CandidateId, role_id: &RoleId) -> bool {
        &self.candidate_id == candidate_id && &self.role_id == role_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_levels_follow_cefr_order() {
        assert!(LanguageLevel::A1 < LanguageLevel::A2);
        assert!(LanguageLevel::B2 < LanguageLevel::C1);
        assert!(LanguageLevel::C1 < LanguageLevel::C2);
        assert_eq!(LanguageLevel::B1.to_string(), "B1");
    }

    #[test]
    fn work_model_uses_hyphenated_onsite_label() {
        let json = serde_json::to_string(&WorkModel::OnSite).expect("serializes");
        assert_eq!(json, "\"On-site\"");
        let parsed: WorkModel = serde_json::from_str("\"Hybrid\"").expect("parses");
        assert_eq!(parsed, WorkModel::Hybrid);
    }

    #[test]
    fn panel_average_keeps_double_precision() {
        let scores: PanelScores =
            serde_json::from_str(r#"{"technical":3.7,"communication":3.8,"business":3.9}"#)
                .expect("parses");

        assert!((scores.average() - 3.8).abs() < 1e-12);
    }

    #[test]
    fn pipeline_entry_without_role_applies_to_every_role() {
        let entry = PipelineEntry {
            candidate_id: CandidateId("c-1".to_string()),
            role_id: None,
            stage: PipelineStage::Screening,
            entered_stage_at: NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid"),
            time_in_pipe_days: 12,
        };

        assert!(entry.applies_to(&CandidateId("c-1".to_string()), &RoleId("r-9".to_string())));
        assert!(!entry.applies_to(&CandidateId("c-2".to_string()), &RoleId("r-9".to_string())));
    }
}

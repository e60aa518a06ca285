mod components;

pub use components::ComponentScore;

use super::constraints;
use super::domain::{Candidate, Interview, MatchScore, Role, ScoreBreakdown};

pub const DEFAULT_EVIDENCE_LIMIT: usize = 5;

/// Stateless aggregator that gates a pair on hard constraints and then combines the four
/// weighted component scores into a 0-100 total.
#[derive(Debug, Clone, Copy)]
pub struct MatchEngine {
    evidence_limit: usize,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_EVIDENCE_LIMIT)
    }
}

/// Unrounded weighted contributions, kept so the total is rounded once from their sum.
struct WeightedComponents {
    leveling: f64,
    function_skills: f64,
    tools: f64,
    background_fit: f64,
}

impl WeightedComponents {
    fn total(&self) -> f64 {
        self.leveling + self.function_skills + self.tools + self.background_fit
    }

    // Rounded independently of `total`, so the breakdown may not add up to the total.
    fn breakdown(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            leveling: to_points(self.leveling),
            function_skills: to_points(self.function_skills),
            tools: to_points(self.tools),
            background_fit: to_points(self.background_fit),
        }
    }
}

fn to_points(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

impl MatchEngine {
    pub fn new(evidence_limit: usize) -> Self {
        Self { evidence_limit }
    }

    pub fn score(
        &self,
        candidate: &Candidate,
        role: &Role,
        interview: Option<&Interview>,
    ) -> MatchScore {
        let report = constraints::evaluate(candidate, role);
        if !report.passed() {
            return MatchScore::rejected(
                candidate.id.clone(),
                role.id.clone(),
                report.summaries(),
            );
        }

        let leveling = components::leveling(candidate, role, interview);
        let function_skills = components::function_skills(candidate, role);
        let tools = components::tools(candidate, role);
        let background_fit = components::background_fit(candidate, role);

        let weights = &role.weights;
        let weighted = WeightedComponents {
            leveling: leveling.score * weights.leveling * 100.0,
            function_skills: function_skills.score * weights.function_skills * 100.0,
            tools: tools.score * weights.tools * 100.0,
            background_fit: background_fit.score * weights.background_fit * 100.0,
        };

        let mut evidence: Vec<String> = [leveling, function_skills, tools, background_fit]
            .into_iter()
            .flat_map(|component| component.evidence)
            .take(self.evidence_limit)
            .collect();

        if candidate.experience_years_total > 0.0 {
            let primary_domain = candidate
                .experience_domains
                .first()
                .map(String::as_str)
                .unwrap_or("General");
            evidence.insert(
                0,
                format!(
                    "{}: {} yrs exp, {} domain",
                    candidate.name, candidate.experience_years_total, primary_domain
                ),
            );
        }

        MatchScore {
            candidate_id: candidate.id.clone(),
            role_id: role.id.clone(),
            total_score: to_points(weighted.total()).min(100),
            breakdown: weighted.breakdown(),
            evidence,
            passed_constraints: true,
            constraint_violations: Vec::new(),
        }
    }
}

/// Scores a pair with the default evidence limit.
pub fn score(candidate: &Candidate, role: &Role, interview: Option<&Interview>) -> MatchScore {
    MatchEngine::default().score(candidate, role, interview)
}

#[cfg(test)]
pub(crate) fn components_for_tests(
    candidate: &Candidate,
    role: &Role,
    interview: Option<&Interview>,
) -> [ComponentScore; 4] {
    [
        components::leveling(candidate, role, interview),
        components::function_skills(candidate, role),
        components::tools(candidate, role),
        components::background_fit(candidate, role),
    ]
}

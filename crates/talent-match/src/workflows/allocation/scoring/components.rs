use std::collections::HashSet;

use super::super::domain::{Candidate, Interview, Role};

const LEVELING_BASE: f64 = 0.5;
const BACKGROUND_BASE: f64 = 0.5;
const STAKEHOLDER_COMMUNICATION_BAR: f64 = 4.0;
const INTERVIEW_NEUTRAL_AVERAGE: f64 = 3.5;

/// Normalised sub-score in `[0, 1]` with the evidence that produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentScore {
    pub score: f64,
    pub evidence: Vec<String>,
}

fn lowercased(values: &[String]) -> Vec<String> {
    values.iter().map(|value| value.to_lowercase()).collect()
}

fn mutual_substring(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    let left = left.to_lowercase();
    let right = right.to_lowercase();
    left.contains(&right) || right.contains(&left)
}

pub(crate) fn leveling(
    candidate: &Candidate,
    role: &Role,
    interview: Option<&Interview>,
) -> ComponentScore {
    if role.leveling_must_haves.is_empty() {
        return ComponentScore {
            score: LEVELING_BASE,
            evidence: Vec::new(),
        };
    }

    let mut evidence = Vec::new();
    let skills = lowercased(&candidate.skills);
    let domains = lowercased(&candidate.experience_domains);

    let mut matches = 0usize;
    for must_have in &role.leveling_must_haves {
        let normalized = must_have.to_lowercase().replace('_', " ");

        if skills.iter().any(|skill| skill.contains(&normalized)) {
            matches += 1;
            evidence.push(format!("Has skill: {must_have}"));
            continue;
        }

        if domains.iter().any(|domain| domain.contains(&normalized)) {
            matches += 1;
            evidence.push(format!("Has domain: {must_have}"));
            continue;
        }

        if let Some(interview) = interview {
            let communication = interview.panel_scores.communication;
            if normalized.contains("stakeholder") && communication >= STAKEHOLDER_COMMUNICATION_BAR
            {
                matches += 1;
                evidence.push(format!("Interview communication: {communication}/5"));
            }
        }
    }

    let mut score = matches as f64 / role.leveling_must_haves.len() as f64;

    if let Some(history) = &candidate.internal_history {
        if history.tenure_months >= 12 {
            score += 0.1;
            evidence.push(format!("Internal tenure: {} months", history.tenure_months));
        }
    }

    if let Some(interview) = interview {
        let average = interview.panel_scores.average();
        score += (average - INTERVIEW_NEUTRAL_AVERAGE) / 10.0;
        evidence.push(format!("Interview avg: {average:.1}/5"));
    }

    ComponentScore {
        score: score.clamp(0.0, 1.0),
        evidence,
    }
}

/// Jaccard similarity between the role's requirement terms and the candidate's skills and domains.
pub(crate) fn function_skills(candidate: &Candidate, role: &Role) -> ComponentScore {
    let mut requirement_order = Vec::new();
    let mut requirements = HashSet::new();
    for term in role
        .leveling_must_haves
        .iter()
        .chain(&role.preferred_skills)
        .chain(&role.experience_domains)
    {
        let term = term.to_lowercase();
        if requirements.insert(term.clone()) {
            requirement_order.push(term);
        }
    }

    let skills = lowercased(&candidate.skills);
    let domains = lowercased(&candidate.experience_domains);
    let offered: HashSet<&str> = skills.iter().chain(&domains).map(String::as_str).collect();

    let shared: Vec<&String> = requirement_order
        .iter()
        .filter(|term| offered.contains(term.as_str()))
        .collect();
    let union = requirements.len() + offered.len() - shared.len();

    let score = if union == 0 {
        0.0
    } else {
        shared.len() as f64 / union as f64
    };

    let mut evidence = Vec::new();
    for term in shared {
        if skills.iter().any(|skill| skill.contains(term.as_str())) {
            evidence.push(format!("Skill match: {term}"));
        }
        if domains.iter().any(|domain| domain.contains(term.as_str())) {
            evidence.push(format!("Domain match: {term}"));
        }
    }

    ComponentScore { score, evidence }
}

pub(crate) fn tools(candidate: &Candidate, role: &Role) -> ComponentScore {
    if role.tools_top5.is_empty() {
        return ComponentScore::default();
    }

    let owned: HashSet<String> = candidate
        .tools
        .iter()
        .map(|tool| tool.to_lowercase())
        .collect();

    let matched: Vec<String> = role
        .tools_top5
        .iter()
        .map(|tool| tool.to_lowercase())
        .filter(|tool| owned.contains(tool))
        .collect();

    ComponentScore {
        score: matched.len() as f64 / role.tools_top5.len() as f64,
        evidence: matched
            .into_iter()
            .map(|tool| format!("Tool match: {tool}"))
            .collect(),
    }
}

pub(crate) fn background_fit(candidate: &Candidate, role: &Role) -> ComponentScore {
    let mut evidence = Vec::new();
    let mut score = BACKGROUND_BASE;

    let internal_history = candidate
        .internal_history
        .as_ref()
        .filter(|_| candidate.is_internal());
    if let Some(history) = internal_history {
        if history.function == role.function {
            score += 0.2;
            evidence.push(format!("Internal: same function ({})", history.function));
        }

        if mutual_substring(&history.last_business_unit, &role.subfunction) {
            score += 0.2;
            evidence.push(format!(
                "Internal: related BU ({})",
                history.last_business_unit
            ));
        }

        if history.tenure_months >= 18 {
            score += 0.1;
            evidence.push(format!(
                "Internal: strong tenure ({} months)",
                history.tenure_months
            ));
        }
    }

    if candidate
        .experience_domains
        .iter()
        .any(|domain| mutual_substring(domain, &role.subfunction))
    {
        score += 0.1;
        evidence.push(format!(
            "Domain fit: {}",
            candidate.experience_domains.join(", ")
        ));
    }

    ComponentScore {
        score: score.clamp(0.0, 1.0),
        evidence,
    }
}

use super::domain::{Candidate, LanguageLevel, Role, WorkModel};

/// Hard-constraint breach recorded before any scoring happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    MissingLanguage {
        code: String,
    },
    LanguageBelowMinimum {
        code: String,
        actual: LanguageLevel,
        required: LanguageLevel,
    },
    LocationMismatch {
        role_country: String,
        candidate_country: String,
    },
}

impl ConstraintViolation {
    pub fn summary(&self) -> String {
        match self {
            ConstraintViolation::MissingLanguage { code } => {
                format!("Missing required language: {code}")
            }
            ConstraintViolation::LanguageBelowMinimum {
                code,
                actual,
                required,
            } => format!("Language {code}: candidate has {actual}, required {required}"),
            ConstraintViolation::LocationMismatch {
                role_country,
                candidate_country,
            } => format!(
                "On-site role requires candidate in {role_country}, candidate is in {candidate_country}"
            ),
        }
    }
}

/// Itemised result of the language and location gates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstraintReport {
    pub violations: Vec<ConstraintViolation>,
}

impl ConstraintReport {
    /// Every recorded violation blocks the pair, whether or not the role marks fluency as hard.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn summaries(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(ConstraintViolation::summary)
            .collect()
    }
}

pub fn evaluate(candidate: &Candidate, role: &Role) -> ConstraintReport {
    let mut violations = language_violations(candidate, role);

    if role.work_model == WorkModel::OnSite && candidate.country != role.country {
        violations.push(ConstraintViolation::LocationMismatch {
            role_country: role.country.clone(),
            candidate_country: candidate.country.clone(),
        });
    }

    ConstraintReport { violations }
}

fn language_violations(candidate: &Candidate, role: &Role) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    for requirement in &role.languages_required {
        match candidate.language(&requirement.code) {
            None => violations.push(ConstraintViolation::MissingLanguage {
                code: requirement.code.clone(),
            }),
            Some(spoken) if spoken.level < requirement.min => {
                violations.push(ConstraintViolation::LanguageBelowMinimum {
                    code: requirement.code.clone(),
                    actual: spoken.level,
                    required: requirement.min,
                })
            }
            Some(_) => {}
        }
    }

    violations
}

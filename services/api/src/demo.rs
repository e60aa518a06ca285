use crate::infra::{InMemoryAllocationRepository, InMemoryEventPublisher};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::sync::Arc;
use talent_match::config::AppConfig;
use talent_match::error::AppError;
use talent_match::workflows::allocation::{
    AllocationEvent, AllocationService, AllocationServiceError, AllocationSnapshot, ApprovalRequest,
    Candidate, CandidateId, CandidateOrigin, HardConstraints, InternalHistory, Interview,
    LanguageLevel, LanguageRequirement, LanguageSkill, MatchScore, MatchView, PanelScores,
    PipelineEntry, PipelineStage, Role, RoleId, RoleShortlist, ScoringWeights, SourcingStrategy,
    WorkModel,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for start-date buffer checks (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Matches shown per role in the ranking step.
    #[arg(long)]
    pub(crate) limit: Option<usize>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let mut matching = AppConfig::load()?.matching;
    if let Some(limit) = args.limit.filter(|limit| *limit > 0) {
        matching.default_limit = limit;
    }

    let seed = seed_snapshot();
    let repository = Arc::new(InMemoryAllocationRepository::seeded(seed.clone()));
    let events = Arc::new(InMemoryEventPublisher::default());
    let service = AllocationService::new(repository, events.clone(), matching.settings())?;

    println!("Talent allocation demo");
    println!(
        "Pool: {} candidates | {} open roles | reference date {}",
        seed.candidates.len(),
        seed.roles.len(),
        today
    );

    println!("\n1. Ranking candidates per role");
    for role in &seed.roles {
        let matches = service.top_matches_for_role(&role.id, None)?;
        println!("\n{} ({})", role.title, role.id);
        render_matches(&seed, &matches);
    }

    println!("\n2. Batch generation");
    let batch = service.generate_batch(MatchView::ByRole)?;
    println!(
        "- Created {} with {} matches across {} roles",
        batch.id,
        batch.matches.len(),
        batch.role_ids().len()
    );
    let sent = service.send_batch(&batch.id)?;
    if let Some(sent_at) = sent.sent_at {
        println!("- Sent to hiring managers at {}", sent_at.format("%Y-%m-%d %H:%M UTC"));
    }

    println!("\n3. Manager approval queue");
    render_queue(&seed, &service.approval_queue(today)?);

    let analyst = RoleId("role-data-analyst".to_string());
    let product = RoleId("role-product-owner".to_string());
    let Some(pick) = service
        .top_matches_for_role(&analyst, Some(1))?
        .into_iter()
        .next()
    else {
        println!("\nNo eligible candidate for {analyst}; stopping here.");
        return Ok(());
    };
    let name = candidate_name(&seed, &pick.candidate_id);

    println!("\n4. Approvals");
    let reservation = service.approve(ApprovalRequest {
        candidate_id: pick.candidate_id.clone(),
        role_id: analyst.clone(),
        // blank actor is recorded as APP_DEFAULT_ACTOR
        actor: String::new(),
        rating: Some(5),
        comment: "Ready to start after notice period".to_string(),
    })?;
    println!(
        "- {} reserved {} for {}",
        reservation.reserved_by,
        name,
        role_title(&seed, &reservation.role_id)
    );
    println!(
        "- Shortlist now holds {} entries after withdrawing competing matches",
        service.shortlist().len()
    );

    match service.approve(ApprovalRequest {
        candidate_id: pick.candidate_id.clone(),
        role_id: product.clone(),
        actor: "product-lead".to_string(),
        rating: None,
        comment: String::new(),
    }) {
        Err(AllocationServiceError::Conflict(conflict)) => println!(
            "- Conflict: {} is already reserved for {}",
            name,
            role_title(&seed, &conflict.existing_role_id)
        ),
        Ok(_) => println!("- Unexpected: second reservation accepted"),
        Err(err) => return Err(err.into()),
    }

    if service.release(&pick.candidate_id, &analyst)?.is_some() {
        println!("- Released {} from {}", name, role_title(&seed, &analyst));
    }
    let moved = service.approve(ApprovalRequest {
        candidate_id: pick.candidate_id.clone(),
        role_id: product.clone(),
        actor: "product-lead".to_string(),
        rating: Some(4),
        comment: "Moved after analyst manager released".to_string(),
    })?;
    println!(
        "- {} re-approved {} for {}",
        moved.reserved_by,
        name,
        role_title(&seed, &moved.role_id)
    );

    println!("\n5. Batch export");
    let mut csv = Vec::new();
    service.export_batch(&batch.id, &mut csv)?;
    print!("{}", String::from_utf8_lossy(&csv));

    println!("\nEvents published");
    for event in events.events() {
        println!("- {}", describe_event(&event));
    }

    Ok(())
}

pub(crate) fn render_matches(snapshot: &AllocationSnapshot, matches: &[MatchScore]) {
    if matches.is_empty() {
        println!("  no candidates pass the hard constraints");
        return;
    }

    for (rank, entry) in matches.iter().enumerate() {
        println!(
            "  {}. {} -> {}: {} (leveling {} | skills {} | tools {} | background {})",
            rank + 1,
            candidate_name(snapshot, &entry.candidate_id),
            role_title(snapshot, &entry.role_id),
            entry.total_score,
            entry.breakdown.leveling,
            entry.breakdown.function_skills,
            entry.breakdown.tools,
            entry.breakdown.background_fit
        );
        for line in entry.evidence.iter().take(3) {
            println!("     - {line}");
        }
    }
}

fn render_queue(snapshot: &AllocationSnapshot, queue: &[RoleShortlist]) {
    for slot in queue {
        let warning = if slot.start_buffer_violation {
            " [start date inside notice buffer]"
        } else {
            ""
        };
        println!("- {}{}", slot.title, warning);
        for entry in &slot.matches {
            println!(
                "    {} ({})",
                candidate_name(snapshot, &entry.candidate_id),
                entry.total_score
            );
        }
    }
}

fn describe_event(event: &AllocationEvent) -> String {
    match event {
        AllocationEvent::BatchCreated { batch_id, matches } => {
            format!("batch {batch_id} created with {matches} matches")
        }
        AllocationEvent::BatchSent { batch_id } => format!("batch {batch_id} sent"),
        AllocationEvent::CandidateReserved {
            candidate_id,
            role_id,
            actor,
            withdrawn,
        } => format!(
            "{actor} reserved {candidate_id} for {role_id} ({withdrawn} competing matches withdrawn)"
        ),
        AllocationEvent::ReservationConflict {
            candidate_id,
            existing_role_id,
            requested_role_id,
        } => format!(
            "conflict: {candidate_id} requested for {requested_role_id}, held by {existing_role_id}"
        ),
        AllocationEvent::ReservationReleased {
            candidate_id,
            role_id,
        } => format!("{candidate_id} released from {role_id}"),
        AllocationEvent::CandidateRejected {
            candidate_id,
            role_id,
            reason,
        } => format!("{candidate_id} rejected for {role_id}: {reason}"),
    }
}

fn candidate_name(snapshot: &AllocationSnapshot, id: &CandidateId) -> String {
    snapshot
        .candidate(id)
        .map(|candidate| candidate.name.clone())
        .unwrap_or_else(|| id.0.clone())
}

fn role_title(snapshot: &AllocationSnapshot, id: &RoleId) -> String {
    snapshot
        .role(id)
        .map(|role| role.title.clone())
        .unwrap_or_else(|| id.0.clone())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn speaks(pairs: &[(&str, LanguageLevel)]) -> Vec<LanguageSkill> {
    pairs
        .iter()
        .map(|(code, level)| LanguageSkill {
            code: code.to_string(),
            level: *level,
        })
        .collect()
}

fn requires(pairs: &[(&str, LanguageLevel)]) -> Vec<LanguageRequirement> {
    pairs
        .iter()
        .map(|(code, min)| LanguageRequirement {
            code: code.to_string(),
            min: *min,
        })
        .collect()
}

/// Small Lisbon-centred talent pool used by `demo`, `rank`, and `serve` without a data file.
pub(crate) fn seed_snapshot() -> AllocationSnapshot {
    use LanguageLevel::{B1, B2, C1, C2};

    let candidates = vec![
        Candidate {
            id: CandidateId("c-001".to_string()),
            name: "Ana Ribeiro".to_string(),
            origin: CandidateOrigin::Internal,
            country: "PT".to_string(),
            time_zone: "Europe/Lisbon".to_string(),
            languages: speaks(&[("en", C1), ("pt", C2)]),
            experience_years_total: 7.0,
            experience_domains: strings(&["retail", "ecommerce"]),
            skills: strings(&["SQL", "Python", "Stakeholder Management", "Dashboards"]),
            tools: strings(&["Tableau", "dbt"]),
            internal_history: Some(InternalHistory {
                function: "Analytics".to_string(),
                tenure_months: 26,
                last_business_unit: "Commercial Analytics".to_string(),
            }),
            availability_date: date(2025, 12, 1),
            notes: "Open to hybrid".to_string(),
        },
        Candidate {
            id: CandidateId("c-002".to_string()),
            name: "Bruno Costa".to_string(),
            origin: CandidateOrigin::External,
            country: "PT".to_string(),
            time_zone: "Europe/Lisbon".to_string(),
            languages: speaks(&[("en", B2), ("pt", C2)]),
            experience_years_total: 5.0,
            experience_domains: strings(&["cloud"]),
            skills: strings(&["Rust", "Kubernetes", "Terraform", "SQL"]),
            tools: strings(&["Docker", "Terraform"]),
            internal_history: None,
            availability_date: date(2026, 1, 5),
            notes: String::new(),
        },
        Candidate {
            id: CandidateId("c-003".to_string()),
            name: "Chen Wei".to_string(),
            origin: CandidateOrigin::External,
            country: "DE".to_string(),
            time_zone: "Europe/Berlin".to_string(),
            languages: speaks(&[("en", C2)]),
            experience_years_total: 9.0,
            experience_domains: strings(&["fintech", "ecommerce"]),
            skills: strings(&["Discovery", "Roadmapping", "SQL", "Python"]),
            tools: strings(&["Jira", "Figma", "Tableau"]),
            internal_history: None,
            availability_date: date(2025, 12, 15),
            notes: "Remote only".to_string(),
        },
        Candidate {
            id: CandidateId("c-004".to_string()),
            name: "Daniela Souza".to_string(),
            origin: CandidateOrigin::Internal,
            country: "PT".to_string(),
            time_zone: "Europe/Lisbon".to_string(),
            languages: speaks(&[("en", B1), ("pt", C2)]),
            experience_years_total: 4.0,
            experience_domains: strings(&["payments"]),
            skills: strings(&["Roadmapping"]),
            tools: strings(&["Jira"]),
            internal_history: Some(InternalHistory {
                function: "Product".to_string(),
                tenure_months: 14,
                last_business_unit: "Payments".to_string(),
            }),
            availability_date: date(2025, 11, 20),
            notes: String::new(),
        },
        Candidate {
            id: CandidateId("c-005".to_string()),
            name: "Erik Larsen".to_string(),
            origin: CandidateOrigin::External,
            country: "NO".to_string(),
            time_zone: "Europe/Oslo".to_string(),
            languages: speaks(&[("en", C1)]),
            experience_years_total: 6.0,
            experience_domains: strings(&["retail"]),
            skills: strings(&["Python", "SQL", "Experimentation"]),
            tools: strings(&["Snowflake", "dbt"]),
            internal_history: None,
            availability_date: date(2026, 1, 15),
            notes: String::new(),
        },
    ];

    let roles = vec![
        Role {
            id: RoleId("role-data-analyst".to_string()),
            title: "Senior Data Analyst".to_string(),
            function: "Analytics".to_string(),
            subfunction: "Commercial Analytics".to_string(),
            country: "PT".to_string(),
            work_model: WorkModel::Hybrid,
            start_preference: date(2025, 12, 15),
            reporting_line: "Head of Analytics".to_string(),
            target_levels: strings(&["Senior"]),
            sourcing_strategy: SourcingStrategy::InternalFirst,
            languages_required: requires(&[("en", B2)]),
            leveling_must_haves: strings(&["sql", "python", "stakeholder_management"]),
            preferred_skills: strings(&["dashboards", "experimentation"]),
            tools_top5: strings(&["tableau", "dbt", "snowflake"]),
            experience_domains: strings(&["retail", "ecommerce"]),
            hard_constraints: HardConstraints::default(),
            weights: ScoringWeights::default(),
            age_days: 21,
            manager: Some("Marta Silva".to_string()),
            ta_responsible: Some("Rui Alves".to_string()),
        },
        Role {
            id: RoleId("role-platform-engineer".to_string()),
            title: "Platform Engineer".to_string(),
            function: "Engineering".to_string(),
            subfunction: "Cloud Platform".to_string(),
            country: "PT".to_string(),
            work_model: WorkModel::OnSite,
            start_preference: date(2026, 2, 1),
            reporting_line: "Platform Lead".to_string(),
            target_levels: strings(&["Mid", "Senior"]),
            sourcing_strategy: SourcingStrategy::Open,
            languages_required: requires(&[("en", B2), ("pt", B1)]),
            leveling_must_haves: strings(&["rust", "kubernetes"]),
            preferred_skills: strings(&["terraform"]),
            tools_top5: strings(&["docker", "terraform", "grafana"]),
            experience_domains: strings(&["cloud"]),
            hard_constraints: HardConstraints::default(),
            weights: ScoringWeights {
                leveling: 0.40,
                function_skills: 0.40,
                tools: 0.15,
                background_fit: 0.05,
            },
            age_days: 9,
            manager: Some("Tiago Nunes".to_string()),
            ta_responsible: Some("Rui Alves".to_string()),
        },
        Role {
            id: RoleId("role-product-owner".to_string()),
            title: "Product Owner, Payments".to_string(),
            function: "Product".to_string(),
            subfunction: "Payments".to_string(),
            country: "PT".to_string(),
            work_model: WorkModel::Remote,
            start_preference: date(2026, 1, 10),
            reporting_line: "VP Product".to_string(),
            target_levels: strings(&["Senior"]),
            sourcing_strategy: SourcingStrategy::InternalOnly,
            languages_required: requires(&[("en", C1)]),
            leveling_must_haves: strings(&["discovery", "roadmapping"]),
            preferred_skills: strings(&["sql"]),
            tools_top5: strings(&["jira", "figma"]),
            experience_domains: strings(&["fintech"]),
            hard_constraints: HardConstraints {
                language_fluent: true,
            },
            weights: ScoringWeights {
                leveling: 0.40,
                function_skills: 0.30,
                tools: 0.10,
                background_fit: 0.20,
            },
            age_days: 35,
            manager: Some("Ines Moura".to_string()),
            ta_responsible: None,
        },
    ];

    let interviews = vec![
        Interview {
            candidate_id: CandidateId("c-001".to_string()),
            role_id: RoleId("role-data-analyst".to_string()),
            panel_scores: PanelScores {
                technical: 4.5,
                communication: 4.5,
                business: 4.0,
            },
            notes: "Clear storytelling with data".to_string(),
        },
        Interview {
            candidate_id: CandidateId("c-005".to_string()),
            role_id: RoleId("role-data-analyst".to_string()),
            panel_scores: PanelScores {
                technical: 3.5,
                communication: 3.0,
                business: 3.5,
            },
            notes: String::new(),
        },
    ];

    let pipeline = vec![
        PipelineEntry {
            candidate_id: CandidateId("c-001".to_string()),
            role_id: Some(RoleId("role-data-analyst".to_string())),
            stage: PipelineStage::ManagerReview,
            entered_stage_at: date(2025, 10, 20),
            time_in_pipe_days: 12,
        },
        PipelineEntry {
            candidate_id: CandidateId("c-005".to_string()),
            role_id: None,
            stage: PipelineStage::Screening,
            entered_stage_at: date(2025, 10, 14),
            time_in_pipe_days: 18,
        },
    ];

    AllocationSnapshot {
        candidates,
        roles,
        interviews,
        pipeline,
        ..AllocationSnapshot::default()
    }
}

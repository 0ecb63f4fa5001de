use chrono::{Local, NaiveDate};
use clap::Args;
use hiring_pipeline::config::PipelineConfig;
use hiring_pipeline::error::AppError;
use hiring_pipeline::workflows::hiring::{
    Actor, ApplicantIntake, ApplicationStage, Direction, HiringPipelineService,
    InMemoryHiringStore, InterviewSchedule, ServiceError, StatusHistoryEntry, TagToggle,
    TransitionRequest,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Examination date (YYYY-MM-DD). Defaults to today + 7 days.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) examination_date: Option<NaiveDate>,
    /// Final interview date (YYYY-MM-DD). Defaults to the examination date + 7 days.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) final_interview_date: Option<NaiveDate>,
    /// Reject and restore the applicant before the job offer.
    #[arg(long)]
    pub(crate) with_rejection: bool,
    /// Print the status history as JSON instead of a table.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn print_stages() {
    println!("Hiring stages");
    for stage in ApplicationStage::ordered() {
        match stage.required_date() {
            Some(kind) => println!("{}. {} (requires {})", stage.index() + 1, stage, kind.field()),
            None => println!("{}. {}", stage.index() + 1, stage),
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        examination_date,
        final_interview_date,
        with_rejection,
        json,
    } = args;

    let examination_date = match examination_date {
        Some(date) => date,
        None => week_after(Local::now().date_naive())?,
    };
    let final_interview_date = match final_interview_date {
        Some(date) => date,
        None => week_after(examination_date)?,
    };
    let schedule = InterviewSchedule {
        examination_date: Some(examination_date),
        final_interview_date: Some(final_interview_date),
    };

    let service = HiringPipelineService::new(
        Arc::new(InMemoryHiringStore::default()),
        PipelineConfig::default(),
    );
    let recruiter = Actor::new("Demo Recruiter", "HR Officer");

    println!("Hiring pipeline demo");
    let record = service.intake(
        ApplicantIntake {
            full_name: "Jamie Dela Cruz".to_string(),
            email: "jamie.delacruz@example.com".to_string(),
            position: "Payroll Specialist".to_string(),
            extra_tags: vec!["referral".to_string()],
        },
        &recruiter,
    )?;
    let id = record.applicant_id.clone();
    println!(
        "- Registered {} ({}) for {}",
        record.profile.full_name, id, record.profile.position
    );

    let step = |comment: &str| {
        TransitionRequest::new(comment, recruiter.clone()).with_schedule(schedule)
    };

    for comment in ["phone screen booked", "passed screen", "exam passed"] {
        let change = service.advance(&id, Direction::Next, step(comment), None)?;
        println!("- Advanced to {}", change.record.application_status);
    }

    service.apply_tag(&id, "follow up", TagToggle::On)?;
    println!("- Tagged FOLLOW UP (tags are not written to the status history)");

    if with_rejection {
        service.reject_or_restore(&id, "missed final interview", &recruiter)?;
        println!("- Rejected: missed final interview");
        match service.advance(&id, Direction::Next, step("try anyway"), None) {
            Err(ServiceError::Transition(err)) => println!("  Step refused: {err}"),
            Err(other) => return Err(other.into()),
            Ok(_) => println!("  Step unexpectedly accepted"),
        }
        service.reject_or_restore(&id, "", &recruiter)?;
        println!("- Restored from rejection");
    }

    for comment in ["offer extended", "offer accepted", "contract signed"] {
        let change = service.advance(&id, Direction::Next, step(comment), None)?;
        println!("- Advanced to {}", change.record.application_status);
    }

    match service.advance(&id, Direction::Next, step("beyond hired"), None) {
        Err(ServiceError::Transition(err)) => println!("- Final step refused: {err}"),
        Err(other) => return Err(other.into()),
        Ok(_) => println!("- Final step unexpectedly accepted"),
    }

    let stored = service.get(&id)?;
    println!(
        "- Current status: {} / {} (revision {})",
        stored.employment_status, stored.application_status, stored.revision
    );

    let history = service.history(&id)?;
    if json {
        match serde_json::to_string_pretty(&history) {
            Ok(payload) => println!("\nStatus history:\n{payload}"),
            Err(err) => println!("\nStatus history unavailable: {err}"),
        }
    } else {
        render_history(&history);
    }

    Ok(())
}

fn week_after(date: NaiveDate) -> Result<NaiveDate, AppError> {
    date.checked_add_signed(chrono::Duration::days(7)).ok_or_else(|| {
        AppError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("no calendar date exists a week after {date}"),
        ))
    })
}

fn render_history(history: &[StatusHistoryEntry]) {
    println!("\nStatus history (newest first)");
    for entry in history {
        let comment = if entry.comment.is_empty() {
            String::new()
        } else {
            format!(" \"{}\"", entry.comment)
        };
        println!(
            "- {} | {:<11} | {:<17} | {} ({}){}",
            entry.status_created.format("%Y-%m-%d %H:%M:%S%.6f"),
            entry.status_type.label(),
            entry.status_value,
            entry.updated_by,
            entry.updated_by_role,
            comment
        );
    }
}

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for applicant records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated user performing a mutation. Resolved by the caller, never by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "updated_by")]
    pub name: String,
    #[serde(rename = "updated_by_role")]
    pub role: String,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// Ordered hiring stages. This is the only declaration of the stage list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApplicationStage {
    #[serde(rename = "Applicant")]
    Applicant,
    #[serde(rename = "Initial Interview")]
    InitialInterview,
    #[serde(rename = "Examination")]
    Examination,
    #[serde(rename = "Final Interview")]
    FinalInterview,
    #[serde(rename = "Job Offer")]
    JobOffer,
    #[serde(rename = "Contract Signing")]
    ContractSigning,
    #[serde(rename = "Hired")]
    Hired,
}

impl ApplicationStage {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Applicant,
            Self::InitialInterview,
            Self::Examination,
            Self::FinalInterview,
            Self::JobOffer,
            Self::ContractSigning,
            Self::Hired,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Applicant => "Applicant",
            Self::InitialInterview => "Initial Interview",
            Self::Examination => "Examination",
            Self::FinalInterview => "Final Interview",
            Self::JobOffer => "Job Offer",
            Self::ContractSigning => "Contract Signing",
            Self::Hired => "Hired",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn at(index: usize) -> Option<Self> {
        Self::ordered().get(index).copied()
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ordered()
            .into_iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(label))
    }

    /// Date that must accompany a move into this stage, if any.
    pub const fn required_date(self) -> Option<ScheduledDateKind> {
        match self {
            Self::Examination => Some(ScheduledDateKind::Examination),
            Self::FinalInterview => Some(ScheduledDateKind::FinalInterview),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value selected for the application axis at the HTTP boundary.
///
/// Older console views post `Reject` as an application status. It is accepted here and
/// resolved onto the employment axis; it never becomes a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSelection {
    Stage(ApplicationStage),
    LegacyReject,
}

impl StageSelection {
    pub fn parse(label: &str) -> Option<Self> {
        if label.trim().eq_ignore_ascii_case("reject") {
            return Some(Self::LegacyReject);
        }
        ApplicationStage::from_label(label).map(Self::Stage)
    }
}

impl<'de> Deserialize<'de> for StageSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown application status '{raw}'")))
    }
}

/// Classification on the employment axis, independent of the interview stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentStatus {
    #[serde(rename = "Applicant")]
    Applicant,
    #[serde(rename = "On Hold")]
    OnHold,
    #[serde(rename = "Rejected")]
    Rejected,
    #[serde(rename = "Hired")]
    Hired,
}

impl EmploymentStatus {
    pub const fn all() -> [Self; 4] {
        [Self::Applicant, Self::OnHold, Self::Rejected, Self::Hired]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Applicant => "Applicant",
            Self::OnHold => "On Hold",
            Self::Rejected => "Rejected",
            Self::Hired => "Hired",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::all()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which axis a ledger entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusType {
    Employment,
    Application,
    /// Free-form annotation that mirrors neither axis.
    Note,
}

impl StatusType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Employment => "employment",
            Self::Application => "application",
            Self::Note => "note",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledDateKind {
    Examination,
    FinalInterview,
}

impl ScheduledDateKind {
    pub const fn field(self) -> &'static str {
        match self {
            Self::Examination => "examination_date",
            Self::FinalInterview => "final_interview_date",
        }
    }
}

/// Dates attached when an applicant enters a date-gated stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examination_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_interview_date: Option<NaiveDate>,
}

impl InterviewSchedule {
    pub fn get(&self, kind: ScheduledDateKind) -> Option<NaiveDate> {
        match kind {
            ScheduledDateKind::Examination => self.examination_date,
            ScheduledDateKind::FinalInterview => self.final_interview_date,
        }
    }

    pub fn set(&mut self, kind: ScheduledDateKind, date: NaiveDate) {
        match kind {
            ScheduledDateKind::Examination => self.examination_date = Some(date),
            ScheduledDateKind::FinalInterview => self.final_interview_date = Some(date),
        }
    }
}

/// Candidate details captured at intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub full_name: String,
    pub email: String,
    pub position: String,
}

/// Submission accepted by the intake endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantIntake {
    pub full_name: String,
    pub email: String,
    pub position: String,
    #[serde(default)]
    pub extra_tags: Vec<String>,
}

/// Authoritative applicant state. Both status axes always agree with the newest ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub applicant_id: ApplicantId,
    pub profile: ApplicantProfile,
    pub employment_status: EmploymentStatus,
    pub application_status: ApplicationStage,
    pub extra_tags: BTreeSet<String>,
    #[serde(flatten)]
    pub schedule: InterviewSchedule,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicantRecord {
    pub fn current_label(&self, status_type: StatusType) -> Option<&'static str> {
        match status_type {
            StatusType::Employment => Some(self.employment_status.label()),
            StatusType::Application => Some(self.application_status.label()),
            StatusType::Note => None,
        }
    }
}

/// Tags are compared case-insensitively; the console shows them upper-cased.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

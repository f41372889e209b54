use chrono::{DateTime, NaiveDate, Utc};

/// Pure person model for inter-module communication (no serde).
///
/// The DPI-style identifier (10-20 numeric digits) is the natural key.
/// `birth_date` keeps the 8-digit DDMMYYYY form the directory stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub dpi: String,
    pub given_name: String,
    pub family_name: String,
    pub birth_date: String,
    pub hire_date: Option<NaiveDate>,
    pub job_level_code: String,
    pub title: String,
    pub area: String,
    pub gender: Option<Gender>,
    pub role: PersonRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Directory roles. `Admin` and `HumanResources` are protected: the role
/// cascade never overwrites them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonRole {
    Admin,
    HumanResources,
    Supervisor,
    Collaborator,
}

impl PersonRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonRole::Admin => "admin",
            PersonRole::HumanResources => "hr",
            PersonRole::Supervisor => "supervisor",
            PersonRole::Collaborator => "collaborator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(PersonRole::Admin),
            "hr" => Some(PersonRole::HumanResources),
            "supervisor" => Some(PersonRole::Supervisor),
            "collaborator" => Some(PersonRole::Collaborator),
            _ => None,
        }
    }

    /// Administrative roles the cascading updater must never downgrade.
    pub fn is_protected(&self) -> bool {
        matches!(self, PersonRole::Admin | PersonRole::HumanResources)
    }
}

/// Hierarchy tier of a job level. Council and Mayor carry bespoke
/// evaluation-eligibility rules; everything else is `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Council,
    Mayor,
    Director,
    General,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Council => "council",
            Tier::Mayor => "mayor",
            Tier::Director => "director",
            Tier::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "council" => Some(Tier::Council),
            "mayor" => Some(Tier::Mayor),
            "director" => Some(Tier::Director),
            "general" => Some(Tier::General),
            _ => None,
        }
    }
}

/// One entry of the job-level reference directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLevel {
    pub code: String,
    pub title: String,
    pub rank: i32,
    pub tier: Tier,
}

/// Progress of a batch write, fired after every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    pub current: usize,
    pub total: usize,
    pub percentage: u8,
}

impl ImportProgress {
    pub fn new(current: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            (100.0 * current as f64 / total as f64).round() as u8
        };
        Self {
            current,
            total,
            percentage,
        }
    }
}

/// Synchronous progress callback consumed by a presentation layer.
pub type ProgressCallback<'a> = &'a (dyn Fn(ImportProgress) + Send + Sync);

/// A record that failed its destination write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    /// Natural identity of the failed record (dpi, or collaborator→supervisor pair).
    pub identity: String,
    pub message: String,
}

/// Result of driving validated records through the batch writer.
///
/// Partial failure is data, not an error: the batch always runs to the end
/// and per-record write failures land in `failures`.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub failures: Vec<ImportFailure>,
    /// Swallowed side-effect (role cascade) failures, surfaced for review.
    pub side_effect_warnings: Vec<String>,
}

/// Validation problems of a single source row, rendered for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based data row number (header row excluded).
    pub row: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Full report of one import run: validation counts plus write outcome.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub duplicates: usize,
    pub row_issues: Vec<RowIssue>,
    pub outcome: BatchOutcome,
}

/// Template flavors exported on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Users,
    Assignments,
}

use async_trait::async_trait;

use crate::contract::model::{JobLevel, Person, PersonRole};
use crate::domain::validate::{CanonicalAssignmentRecord, CanonicalUserRecord};

/// Ports for the domain layer: the three persistence shapes the pipeline
/// needs (idempotent upsert, point lookup by natural key, active-set
/// snapshot). Object-safe and async-friendly via `async_trait`; the domain
/// never sees the concrete engine behind them.
#[async_trait]
pub trait PersonsRepository: Send + Sync {
    /// Point lookup by normalized identifier.
    async fn find_by_dpi(&self, dpi: &str) -> anyhow::Result<Option<Person>>;

    /// All active directory entries, for the per-run snapshot.
    async fn all_active(&self) -> anyhow::Result<Vec<Person>>;

    /// Insert-or-update keyed on `dpi`. Profile fields are overwritten;
    /// role and active flag of an existing row are left alone.
    async fn upsert(&self, record: &CanonicalUserRecord) -> anyhow::Result<()>;

    /// Overwrite the role of an existing person.
    async fn set_role(&self, dpi: &str, role: PersonRole) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AssignmentsRepository: Send + Sync {
    /// Insert-or-update keyed on `(collaborator_dpi, supervisor_dpi)`.
    async fn upsert(&self, record: &CanonicalAssignmentRecord) -> anyhow::Result<()>;

    /// Number of active assignments supervised by `supervisor_dpi`.
    async fn count_active_for_supervisor(&self, supervisor_dpi: &str) -> anyhow::Result<u64>;

    /// Distinct supervisors across all active assignments.
    async fn active_supervisor_dpis(&self) -> anyhow::Result<Vec<String>>;
}

#[async_trait]
pub trait JobLevelsRepository: Send + Sync {
    /// The full job-level reference directory.
    async fn all(&self) -> anyhow::Result<Vec<JobLevel>>;
}

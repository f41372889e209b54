//! Cascading role promotion for supervisors.
//!
//! Runs after assignment writes, decoupled from them: a failure here is
//! logged and surfaced as a side-effect warning, never as a failure of the
//! write that triggered it.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, instrument};

use crate::contract::model::PersonRole;
use crate::domain::repo::{AssignmentsRepository, PersonsRepository};

#[derive(Clone)]
pub struct RoleUpdater {
    persons: Arc<dyn PersonsRepository>,
    assignments: Arc<dyn AssignmentsRepository>,
}

impl RoleUpdater {
    pub fn new(
        persons: Arc<dyn PersonsRepository>,
        assignments: Arc<dyn AssignmentsRepository>,
    ) -> Self {
        Self {
            persons,
            assignments,
        }
    }

    /// Promote the person to `Supervisor` once they hold at least one active
    /// assignment. Protected administrative roles are never overwritten.
    /// Idempotent; returns whether a promotion was applied.
    #[instrument(name = "org_directory.roles.promote", skip(self))]
    pub async fn promote_if_supervising(&self, supervisor_dpi: &str) -> anyhow::Result<bool> {
        let active = self
            .assignments
            .count_active_for_supervisor(supervisor_dpi)
            .await?;
        if active == 0 {
            return Ok(false);
        }

        let person = self
            .persons
            .find_by_dpi(supervisor_dpi)
            .await?
            .ok_or_else(|| anyhow!("supervisor '{supervisor_dpi}' not found in directory"))?;

        if person.role.is_protected() || person.role == PersonRole::Supervisor {
            return Ok(false);
        }

        self.persons
            .set_role(supervisor_dpi, PersonRole::Supervisor)
            .await?;
        debug!(supervisor = %supervisor_dpi, "promoted to supervisor role");
        Ok(true)
    }

    /// One-off corrective recomputation across every distinct supervisor of
    /// an active assignment. Returns the number of promotions applied.
    #[instrument(name = "org_directory.roles.recompute_all", skip(self))]
    pub async fn recompute_all(&self) -> anyhow::Result<u32> {
        let mut promoted = 0;
        for dpi in self.assignments.active_supervisor_dpis().await? {
            if self.promote_if_supervising(&dpi).await? {
                promoted += 1;
            }
        }
        Ok(promoted)
    }
}

//! The import pipeline service: file → sheet → mapping → validation →
//! chunked idempotent batch write → role cascade.
//!
//! Chunks run strictly sequentially; a per-record write failure is captured
//! and the batch continues. Only precondition failures (unreadable file,
//! unreachable reference data) escape as errors.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use tabular::mapper::ColumnMapping;

use crate::contract::model::{
    BatchOutcome, ImportFailure, ImportProgress, ImportReport, ProgressCallback,
};
use crate::domain::columns::{
    self, ASSIGNMENT_FIELD_PATTERNS, USER_FIELD_PATTERNS,
};
use crate::domain::error::ImportError;
use crate::domain::repo::{AssignmentsRepository, JobLevelsRepository, PersonsRepository};
use crate::domain::roles::RoleUpdater;
use crate::domain::snapshot::DirectorySnapshot;
use crate::domain::validate::{
    self, BatchValidation, CanonicalAssignmentRecord, CanonicalUserRecord,
};

/// Tuning knobs for the batch writer.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub user_chunk_size: usize,
    pub assignment_chunk_size: usize,
    /// Pause between chunks (not after the last one).
    pub chunk_pause: Duration,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            user_chunk_size: 50,
            assignment_chunk_size: 10,
            chunk_pause: Duration::from_millis(150),
        }
    }
}

/// Domain service for the whole import pipeline. Depends only on the
/// repository ports, not on infra types.
#[derive(Clone)]
pub struct ImportService {
    persons: Arc<dyn PersonsRepository>,
    assignments: Arc<dyn AssignmentsRepository>,
    job_levels: Arc<dyn JobLevelsRepository>,
    roles: RoleUpdater,
    config: ImportConfig,
}

impl ImportService {
    pub fn new(
        persons: Arc<dyn PersonsRepository>,
        assignments: Arc<dyn AssignmentsRepository>,
        job_levels: Arc<dyn JobLevelsRepository>,
        config: ImportConfig,
    ) -> Self {
        let roles = RoleUpdater::new(persons.clone(), assignments.clone());
        Self {
            persons,
            assignments,
            job_levels,
            roles,
            config,
        }
    }

    /// Import a user file: parse, auto-map, validate, batch-upsert.
    #[instrument(name = "org_directory.import.users", skip(self, bytes, on_progress))]
    pub async fn import_users_file(
        &self,
        bytes: &[u8],
        extension: &str,
        on_progress: ProgressCallback<'_>,
    ) -> Result<ImportReport, ImportError> {
        let sheet = tabular::sheet::parse_bytes(bytes, extension)?;
        let mapping = ColumnMapping::auto(&sheet.headers, USER_FIELD_PATTERNS);
        let rows = columns::project_users(&sheet, &mapping);

        let snapshot = DirectorySnapshot::load(&*self.persons, &*self.job_levels).await?;
        let batch = validate::validate_users(&snapshot, &rows);
        info!(
            total = batch.total,
            valid = batch.valid.len(),
            invalid = batch.invalid,
            "validated user file"
        );

        let outcome = self.write_users(&batch.valid, on_progress).await;
        Ok(assemble_report(batch, outcome))
    }

    /// Import an assignment file: parse, auto-map, validate (including the
    /// permission engine), batch-upsert, cascade supervisor roles.
    #[instrument(name = "org_directory.import.assignments", skip(self, bytes, on_progress))]
    pub async fn import_assignments_file(
        &self,
        bytes: &[u8],
        extension: &str,
        on_progress: ProgressCallback<'_>,
    ) -> Result<ImportReport, ImportError> {
        let sheet = tabular::sheet::parse_bytes(bytes, extension)?;
        let mapping = ColumnMapping::auto(&sheet.headers, ASSIGNMENT_FIELD_PATTERNS);
        let rows = columns::project_assignments(&sheet, &mapping);

        let snapshot = DirectorySnapshot::load(&*self.persons, &*self.job_levels).await?;
        let batch = validate::validate_assignments(&snapshot, &rows);
        info!(
            total = batch.total,
            valid = batch.valid.len(),
            invalid = batch.invalid,
            duplicates = batch.duplicates,
            "validated assignment file"
        );

        let outcome = self.write_assignments(&batch.valid, on_progress).await;
        Ok(assemble_report(batch, outcome))
    }

    /// Chunked sequential upsert of user records.
    pub async fn write_users(
        &self,
        records: &[CanonicalUserRecord],
        on_progress: ProgressCallback<'_>,
    ) -> BatchOutcome {
        let total = records.len();
        let mut outcome = BatchOutcome::default();
        let mut current = 0;

        for (index, chunk) in records.chunks(self.config.user_chunk_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.chunk_pause).await;
            }
            for record in chunk {
                current += 1;
                match self.persons.upsert(record).await {
                    Ok(()) => outcome.success_count += 1,
                    Err(e) => outcome.failures.push(ImportFailure {
                        identity: record.dpi.clone(),
                        message: e.to_string(),
                    }),
                }
                on_progress(ImportProgress::new(current, total));
            }
        }
        outcome
    }

    /// Chunked sequential upsert of assignment records, with the role
    /// cascade fired once per successful write. Cascade failures are logged
    /// and recorded as side-effect warnings; they never touch the outcome of
    /// the write itself.
    pub async fn write_assignments(
        &self,
        records: &[CanonicalAssignmentRecord],
        on_progress: ProgressCallback<'_>,
    ) -> BatchOutcome {
        let total = records.len();
        let mut outcome = BatchOutcome::default();
        let mut current = 0;

        for (index, chunk) in records.chunks(self.config.assignment_chunk_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.chunk_pause).await;
            }
            for record in chunk {
                current += 1;
                match self.assignments.upsert(record).await {
                    Ok(()) => {
                        outcome.success_count += 1;
                        if let Err(e) = self.roles.promote_if_supervising(&record.supervisor_dpi).await
                        {
                            warn!(
                                supervisor = %record.supervisor_dpi,
                                error = %e,
                                "role cascade failed; assignment write stands"
                            );
                            outcome.side_effect_warnings.push(format!(
                                "role update for supervisor '{}' failed: {e}",
                                record.supervisor_dpi
                            ));
                        }
                    }
                    Err(e) => outcome.failures.push(ImportFailure {
                        identity: record.identity(),
                        message: e.to_string(),
                    }),
                }
                on_progress(ImportProgress::new(current, total));
            }
        }
        outcome
    }

    /// Bulk corrective role recomputation (outside the steady-state path).
    pub async fn recompute_supervisor_roles(&self) -> Result<u32, ImportError> {
        self.roles
            .recompute_all()
            .await
            .map_err(|e| ImportError::store(e.to_string()))
    }

    pub fn user_template(&self) -> Result<String, ImportError> {
        let (headers, rows) = columns::user_template();
        render_template(&headers, &rows)
    }

    pub fn assignment_template(&self) -> Result<String, ImportError> {
        let (headers, rows) = columns::assignment_template();
        render_template(&headers, &rows)
    }
}

fn render_template(headers: &[&str], rows: &[Vec<&str>]) -> Result<String, ImportError> {
    let row_slices: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
    Ok(tabular::template::render_csv(headers, &row_slices)?)
}

fn assemble_report<T>(batch: BatchValidation<T>, outcome: BatchOutcome) -> ImportReport {
    ImportReport {
        total: batch.total,
        valid: batch.valid.len(),
        invalid: batch.invalid,
        duplicates: batch.duplicates,
        row_issues: batch.row_issues,
        outcome,
    }
}

//! Per-run read-only view of the directory.
//!
//! Loaded once before validation starts and never refreshed mid-run, so
//! duplicate and referential checks are run-scoped by construction.

use std::collections::HashMap;

use crate::contract::model::{JobLevel, Person, Tier};
use crate::domain::error::ImportError;
use crate::domain::repo::{JobLevelsRepository, PersonsRepository};

/// The job-level reference directory, with the sorted code list kept around
/// for rejection messages.
#[derive(Debug, Clone, Default)]
pub struct JobLevelDirectory {
    by_code: HashMap<String, JobLevel>,
    codes: Vec<String>,
}

impl JobLevelDirectory {
    pub fn new(levels: Vec<JobLevel>) -> Self {
        let mut codes: Vec<String> = levels.iter().map(|l| l.code.clone()).collect();
        codes.sort();
        let by_code = levels.into_iter().map(|l| (l.code.clone(), l)).collect();
        Self { by_code, codes }
    }

    pub fn get(&self, code: &str) -> Option<&JobLevel> {
        self.by_code.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    /// Tier of a code; unknown codes fall back to the unrestricted tier.
    pub fn tier_of(&self, code: &str) -> Tier {
        self.get(code).map(|l| l.tier).unwrap_or(Tier::General)
    }

    /// Sorted valid code set, for error messages.
    pub fn valid_codes(&self) -> &[String] {
        &self.codes
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// Read-only map of normalized identifier → active person, plus the
/// job-level directory.
pub struct DirectorySnapshot {
    persons: HashMap<String, Person>,
    levels: JobLevelDirectory,
}

impl DirectorySnapshot {
    /// Load the snapshot. Fails with a precondition error when the reference
    /// data cannot be reached or the job-level directory is empty; that
    /// aborts the whole run before any write.
    pub async fn load(
        persons: &dyn PersonsRepository,
        job_levels: &dyn JobLevelsRepository,
    ) -> Result<Self, ImportError> {
        let levels = job_levels
            .all()
            .await
            .map_err(|e| ImportError::precondition(format!("job levels: {e}")))?;
        let levels = JobLevelDirectory::new(levels);
        if levels.is_empty() {
            return Err(ImportError::precondition(
                "job level directory is empty".to_string(),
            ));
        }

        let active = persons
            .all_active()
            .await
            .map_err(|e| ImportError::precondition(format!("directory: {e}")))?;
        let persons = active.into_iter().map(|p| (p.dpi.clone(), p)).collect();

        Ok(Self { persons, levels })
    }

    #[cfg(test)]
    pub fn from_parts(persons: Vec<Person>, levels: Vec<JobLevel>) -> Self {
        Self {
            persons: persons.into_iter().map(|p| (p.dpi.clone(), p)).collect(),
            levels: JobLevelDirectory::new(levels),
        }
    }

    pub fn person(&self, dpi: &str) -> Option<&Person> {
        self.persons.get(dpi)
    }

    pub fn levels(&self) -> &JobLevelDirectory {
        &self.levels
    }
}

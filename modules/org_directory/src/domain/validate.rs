//! Ordered, short-circuiting record validation.
//!
//! Format, referential and business-rule errors all resolve here and never
//! reach persistence; warnings ride along with the record. The validators
//! carry the run-scoped duplicate sets, so one instance must live exactly as
//! long as one import run.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::contract::model::{Gender, RowIssue};
use crate::domain::columns::{
    RawAssignmentRow, RawUserRow, ASSIGN_COLLABORATOR, ASSIGN_SUPERVISOR, USER_BIRTH_DATE,
    USER_DPI, USER_NAME,
};
use crate::domain::error::{RecordError, RecordWarning};
use crate::domain::normalize::{self, GenderOutcome};
use crate::domain::permission;
use crate::domain::snapshot::DirectorySnapshot;

/// Fully normalized, validated user record, ready for the batch writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUserRecord {
    pub dpi: String,
    pub given_name: String,
    pub family_name: String,
    /// 8-digit DDMMYYYY, guaranteed to be a real calendar date.
    pub birth_date: String,
    pub hire_date: Option<NaiveDate>,
    pub job_level_code: String,
    pub title: String,
    pub area: String,
    pub gender: Option<Gender>,
}

/// Fully normalized, validated assignment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalAssignmentRecord {
    pub collaborator_dpi: String,
    pub supervisor_dpi: String,
    pub group_id: Option<String>,
}

impl CanonicalAssignmentRecord {
    pub fn identity(&self) -> String {
        format!("{}->{}", self.collaborator_dpi, self.supervisor_dpi)
    }
}

/// Outcome of validating one record; immutable once produced.
#[derive(Debug, Clone)]
pub struct ValidationResult<T> {
    pub errors: Vec<RecordError>,
    pub warnings: Vec<RecordWarning>,
    pub payload: Option<T>,
}

impl<T> ValidationResult<T> {
    fn failed(error: RecordError, warnings: Vec<RecordWarning>) -> Self {
        Self {
            errors: vec![error],
            warnings,
            payload: None,
        }
    }

    fn ok(payload: T, warnings: Vec<RecordWarning>) -> Self {
        Self {
            errors: Vec::new(),
            warnings,
            payload: Some(payload),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.payload.is_some()
    }
}

/// Assignment validator with the run-scoped set of accepted pairs.
pub struct AssignmentValidator<'a> {
    snapshot: &'a DirectorySnapshot,
    seen_pairs: HashSet<(String, String)>,
}

impl<'a> AssignmentValidator<'a> {
    pub fn new(snapshot: &'a DirectorySnapshot) -> Self {
        Self {
            snapshot,
            seen_pairs: HashSet::new(),
        }
    }

    pub fn validate(&mut self, raw: &RawAssignmentRow) -> ValidationResult<CanonicalAssignmentRecord> {
        let mut warnings = Vec::new();

        // 1-2: collaborator identifier, then directory resolution.
        let collaborator = match normalize::identifier(&raw.collaborator.as_text()) {
            Ok(id) => {
                if id.had_whitespace {
                    warnings.push(RecordWarning::WhitespaceNormalized {
                        field: ASSIGN_COLLABORATOR,
                        raw: raw.collaborator.as_text(),
                    });
                }
                id.digits
            }
            Err(message) => {
                return ValidationResult::failed(
                    RecordError::format(ASSIGN_COLLABORATOR, message),
                    warnings,
                )
            }
        };
        let Some(collaborator_entry) = self.snapshot.person(&collaborator) else {
            return ValidationResult::failed(
                RecordError::referential(format!(
                    "collaborator '{collaborator}' is not an active directory entry"
                )),
                warnings,
            );
        };

        // 3-4: supervisor identifier, then directory resolution.
        let supervisor = match normalize::identifier(&raw.supervisor.as_text()) {
            Ok(id) => {
                if id.had_whitespace {
                    warnings.push(RecordWarning::WhitespaceNormalized {
                        field: ASSIGN_SUPERVISOR,
                        raw: raw.supervisor.as_text(),
                    });
                }
                id.digits
            }
            Err(message) => {
                return ValidationResult::failed(
                    RecordError::format(ASSIGN_SUPERVISOR, message),
                    warnings,
                )
            }
        };
        let Some(supervisor_entry) = self.snapshot.person(&supervisor) else {
            return ValidationResult::failed(
                RecordError::referential(format!(
                    "supervisor '{supervisor}' is not an active directory entry"
                )),
                warnings,
            );
        };

        // 5: self-assignment.
        if collaborator == supervisor {
            return ValidationResult::failed(
                RecordError::business_rule(format!(
                    "'{collaborator}' cannot be assigned as their own supervisor"
                )),
                warnings,
            );
        }

        // 6: tier-keyed permission table.
        let levels = self.snapshot.levels();
        let supervisor_tier = levels.tier_of(&supervisor_entry.job_level_code);
        let collaborator_tier = levels.tier_of(&collaborator_entry.job_level_code);
        if let Err(denial) = permission::check_import(supervisor_tier, collaborator_tier) {
            return ValidationResult::failed(
                RecordError::business_rule(denial.to_string()),
                warnings,
            );
        }

        // 7: run-scoped duplicate pair: warning only, the write is idempotent.
        let pair = (collaborator.clone(), supervisor.clone());
        if !self.seen_pairs.insert(pair) {
            warnings.push(RecordWarning::Duplicate {
                identity: format!("{collaborator}->{supervisor}"),
            });
        }

        // 8: optional group id.
        let group = raw.group.as_text();
        let group_id = if group.is_empty() { None } else { Some(group) };

        ValidationResult::ok(
            CanonicalAssignmentRecord {
                collaborator_dpi: collaborator,
                supervisor_dpi: supervisor,
                group_id,
            },
            warnings,
        )
    }
}

/// User validator with the run-scoped set of accepted identifiers.
pub struct UserValidator<'a> {
    snapshot: &'a DirectorySnapshot,
    seen_dpis: HashSet<String>,
}

impl<'a> UserValidator<'a> {
    pub fn new(snapshot: &'a DirectorySnapshot) -> Self {
        Self {
            snapshot,
            seen_dpis: HashSet::new(),
        }
    }

    pub fn validate(&mut self, raw: &RawUserRow) -> ValidationResult<CanonicalUserRecord> {
        let mut warnings = Vec::new();

        let dpi = match normalize::identifier(&raw.dpi.as_text()) {
            Ok(id) => {
                if id.had_whitespace {
                    warnings.push(RecordWarning::WhitespaceNormalized {
                        field: USER_DPI,
                        raw: raw.dpi.as_text(),
                    });
                }
                id.digits
            }
            Err(message) => {
                return ValidationResult::failed(RecordError::format(USER_DPI, message), warnings)
            }
        };

        let (given_name, family_name) = match normalize::split_name(&raw.name.as_text()) {
            Ok(parts) => parts,
            Err(message) => {
                return ValidationResult::failed(RecordError::format(USER_NAME, message), warnings)
            }
        };

        let birth_date = match normalize::birth_date(&raw.birth_date) {
            Ok(date) => date,
            Err(message) => {
                return ValidationResult::failed(
                    RecordError::format(USER_BIRTH_DATE, message),
                    warnings,
                )
            }
        };

        let hire_date = normalize::hire_date(&raw.hire_date);

        let job_level_code = normalize::job_level_code(&raw.level.as_text());
        let levels = self.snapshot.levels();
        if !levels.contains(&job_level_code) {
            return ValidationResult::failed(
                RecordError::referential(format!(
                    "unknown job level '{job_level_code}' (valid codes: {})",
                    levels.valid_codes().join(", ")
                )),
                warnings,
            );
        }

        let gender = match normalize::gender(&raw.gender.as_text()) {
            GenderOutcome::Recognized(g) => Some(g),
            GenderOutcome::Blank => None,
            GenderOutcome::Unrecognized(value) => {
                warnings.push(RecordWarning::UnrecognizedGender { raw: value });
                None
            }
        };

        // Run-scoped duplicate identifier: warning only, upsert is idempotent.
        if !self.seen_dpis.insert(dpi.clone()) {
            warnings.push(RecordWarning::Duplicate {
                identity: dpi.clone(),
            });
        }

        ValidationResult::ok(
            CanonicalUserRecord {
                dpi,
                given_name,
                family_name,
                birth_date,
                hire_date,
                job_level_code,
                title: raw.title.as_text(),
                area: raw.area.as_text(),
                gender,
            },
            warnings,
        )
    }
}

/// Aggregated result of validating a whole file.
#[derive(Debug)]
pub struct BatchValidation<T> {
    pub total: usize,
    pub valid: Vec<T>,
    pub invalid: usize,
    pub duplicates: usize,
    pub row_issues: Vec<RowIssue>,
}

fn aggregate<T>(results: Vec<ValidationResult<T>>) -> BatchValidation<T> {
    let total = results.len();
    let mut valid = Vec::new();
    let mut invalid = 0;
    let mut duplicates = 0;
    let mut row_issues = Vec::new();

    for (index, result) in results.into_iter().enumerate() {
        duplicates += result
            .warnings
            .iter()
            .filter(|w| matches!(w, RecordWarning::Duplicate { .. }))
            .count();

        if !result.errors.is_empty() || !result.warnings.is_empty() {
            row_issues.push(RowIssue {
                row: index + 1,
                errors: result.errors.iter().map(|e| e.to_string()).collect(),
                warnings: result.warnings.iter().map(|w| w.to_string()).collect(),
            });
        }

        match result.payload {
            Some(record) => valid.push(record),
            None => invalid += 1,
        }
    }

    BatchValidation {
        total,
        valid,
        invalid,
        duplicates,
        row_issues,
    }
}

pub fn validate_users(
    snapshot: &DirectorySnapshot,
    rows: &[RawUserRow],
) -> BatchValidation<CanonicalUserRecord> {
    let mut validator = UserValidator::new(snapshot);
    aggregate(rows.iter().map(|r| validator.validate(r)).collect())
}

pub fn validate_assignments(
    snapshot: &DirectorySnapshot,
    rows: &[RawAssignmentRow],
) -> BatchValidation<CanonicalAssignmentRecord> {
    let mut validator = AssignmentValidator::new(snapshot);
    aggregate(rows.iter().map(|r| validator.validate(r)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{JobLevel, Person, PersonRole, Tier};
    use chrono::Utc;
    use tabular::sheet::Cell;

    fn person(dpi: &str, level: &str) -> Person {
        Person {
            dpi: dpi.to_string(),
            given_name: "Test".to_string(),
            family_name: "Person".to_string(),
            birth_date: "01011980".to_string(),
            hire_date: None,
            job_level_code: level.to_string(),
            title: String::new(),
            area: String::new(),
            gender: None,
            role: PersonRole::Collaborator,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn levels() -> Vec<JobLevel> {
        vec![
            JobLevel {
                code: "CON".into(),
                title: "Concejal".into(),
                rank: 100,
                tier: Tier::Council,
            },
            JobLevel {
                code: "AL".into(),
                title: "Alcalde".into(),
                rank: 90,
                tier: Tier::Mayor,
            },
            JobLevel {
                code: "DIR".into(),
                title: "Director".into(),
                rank: 80,
                tier: Tier::Director,
            },
            JobLevel {
                code: "TEC".into(),
                title: "Tecnico".into(),
                rank: 40,
                tier: Tier::General,
            },
        ]
    }

    fn snapshot() -> DirectorySnapshot {
        DirectorySnapshot::from_parts(
            vec![
                person("1000000000001", "TEC"),
                person("1000000000002", "DIR"),
                person("1000000000003", "CON"),
                person("1000000000004", "AL"),
            ],
            levels(),
        )
    }

    fn assignment(collaborator: &str, supervisor: &str) -> RawAssignmentRow {
        RawAssignmentRow {
            collaborator: Cell::Text(collaborator.to_string()),
            supervisor: Cell::Text(supervisor.to_string()),
            group: Cell::Empty,
        }
    }

    #[test]
    fn valid_assignment_passes() {
        let snapshot = snapshot();
        let mut validator = AssignmentValidator::new(&snapshot);
        let result = validator.validate(&assignment("1000000000001", "1000000000002"));
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn unknown_collaborator_is_referential_error() {
        let snapshot = snapshot();
        let mut validator = AssignmentValidator::new(&snapshot);
        let result = validator.validate(&assignment("9999999999999", "1000000000002"));
        assert!(!result.is_valid());
        assert!(matches!(result.errors[0], RecordError::Referential { .. }));
    }

    #[test]
    fn self_assignment_is_rejected_post_normalization() {
        let snapshot = snapshot();
        let mut validator = AssignmentValidator::new(&snapshot);
        // Same identifier, one with whitespace: equal after normalization.
        let result = validator.validate(&assignment("1000 0000 00001", "1000000000001"));
        assert!(!result.is_valid());
        assert!(matches!(result.errors[0], RecordError::BusinessRule { .. }));
    }

    #[test]
    fn council_supervising_director_is_accepted() {
        let snapshot = snapshot();
        let mut validator = AssignmentValidator::new(&snapshot);
        let result = validator.validate(&assignment("1000000000002", "1000000000003"));
        assert!(result.is_valid());
    }

    #[test]
    fn council_supervising_council_is_rejected_with_tier_message() {
        let snapshot = DirectorySnapshot::from_parts(
            vec![
                person("1000000000003", "CON"),
                person("1000000000005", "CON"),
            ],
            levels(),
        );
        let mut validator = AssignmentValidator::new(&snapshot);
        let result = validator.validate(&assignment("1000000000005", "1000000000003"));
        assert!(!result.is_valid());
        let message = result.errors[0].to_string();
        assert!(message.contains("council"), "got: {message}");
    }

    #[test]
    fn mayor_supervising_non_director_is_rejected() {
        let snapshot = snapshot();
        let mut validator = AssignmentValidator::new(&snapshot);
        let result = validator.validate(&assignment("1000000000001", "1000000000004"));
        assert!(!result.is_valid());
    }

    #[test]
    fn duplicate_pair_is_warning_not_error() {
        let snapshot = snapshot();
        let mut validator = AssignmentValidator::new(&snapshot);
        assert!(validator
            .validate(&assignment("1000000000001", "1000000000002"))
            .is_valid());
        let second = validator.validate(&assignment("1000000000001", "1000000000002"));
        assert!(second.is_valid());
        assert!(second
            .warnings
            .iter()
            .any(|w| matches!(w, RecordWarning::Duplicate { .. })));
    }

    #[test]
    fn whitespace_identifier_keeps_warning() {
        let snapshot = snapshot();
        let mut validator = AssignmentValidator::new(&snapshot);
        let result = validator.validate(&assignment("1000 0000 00001", "1000000000002"));
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, RecordWarning::WhitespaceNormalized { .. })));
        assert_eq!(result.payload.unwrap().collaborator_dpi, "1000000000001");
    }

    fn user_row(dpi: &str, name: &str, birth: &str, level: &str) -> RawUserRow {
        RawUserRow {
            dpi: Cell::Text(dpi.to_string()),
            name: Cell::Text(name.to_string()),
            birth_date: Cell::Text(birth.to_string()),
            hire_date: Cell::Empty,
            level: Cell::Text(level.to_string()),
            title: Cell::Text("Tecnico".to_string()),
            area: Cell::Text("Obras".to_string()),
            gender: Cell::Empty,
        }
    }

    #[test]
    fn valid_user_normalizes_all_fields() {
        let snapshot = snapshot();
        let mut validator = UserValidator::new(&snapshot);
        let result = validator.validate(&user_row(
            "2000000000001",
            "Ana Maria Lopez",
            "15-03-1990",
            "tec",
        ));
        assert!(result.is_valid());
        let record = result.payload.unwrap();
        assert_eq!(record.given_name, "Ana");
        assert_eq!(record.family_name, "Maria Lopez");
        assert_eq!(record.birth_date, "15031990");
        assert_eq!(record.job_level_code, "TEC");
    }

    #[test]
    fn unknown_level_lists_valid_codes() {
        let snapshot = snapshot();
        let mut validator = UserValidator::new(&snapshot);
        let result = validator.validate(&user_row(
            "2000000000001",
            "Ana Lopez",
            "15031990",
            "XYZ9",
        ));
        assert!(!result.is_valid());
        let message = result.errors[0].to_string();
        assert!(message.contains("XYZ9"));
        assert!(message.contains("AL, CON, DIR, TEC"), "got: {message}");
    }

    #[test]
    fn bad_birth_date_fails_the_row() {
        let snapshot = snapshot();
        let mut validator = UserValidator::new(&snapshot);
        let result =
            validator.validate(&user_row("2000000000001", "Ana Lopez", "31/02/2020", "TEC"));
        assert!(!result.is_valid());
        assert!(matches!(
            result.errors[0],
            RecordError::Format {
                field: USER_BIRTH_DATE,
                ..
            }
        ));
    }

    #[test]
    fn batch_counts_duplicates_and_invalids() {
        let snapshot = snapshot();
        let rows = vec![
            assignment("1000000000001", "1000000000002"),
            assignment("1000000000001", "1000000000002"),
            assignment("9999999999999", "1000000000002"),
        ];
        let batch = validate_assignments(&snapshot, &rows);
        assert_eq!(batch.total, 3);
        assert_eq!(batch.valid.len(), 2);
        assert_eq!(batch.invalid, 1);
        assert_eq!(batch.duplicates, 1);
        assert_eq!(batch.row_issues.len(), 2);
    }
}

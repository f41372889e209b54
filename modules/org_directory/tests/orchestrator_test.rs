//! Batch writer contract tests: progress shape and partial-failure isolation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use org_directory::contract::model::ImportProgress;
use org_directory::domain::import::{ImportConfig, ImportService};
use org_directory::domain::repo::{AssignmentsRepository, PersonsRepository};
use org_directory::domain::validate::{CanonicalAssignmentRecord, CanonicalUserRecord};
use org_directory::infra::storage::migrations::Migrator;
use org_directory::infra::storage::repo::{
    SeaOrmAssignmentsRepository, SeaOrmJobLevelsRepository, SeaOrmPersonsRepository,
};

async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    db
}

fn user(dpi: &str) -> CanonicalUserRecord {
    CanonicalUserRecord {
        dpi: dpi.to_string(),
        given_name: "Test".to_string(),
        family_name: "Person".to_string(),
        birth_date: "01011980".to_string(),
        hire_date: None,
        job_level_code: "TEC".to_string(),
        title: String::new(),
        area: String::new(),
        gender: None,
    }
}

fn pair(collaborator: &str, supervisor: &str) -> CanonicalAssignmentRecord {
    CanonicalAssignmentRecord {
        collaborator_dpi: collaborator.to_string(),
        supervisor_dpi: supervisor.to_string(),
        group_id: None,
    }
}

/// Wraps the real repository and fails one specific upsert call.
struct FlakyAssignmentsRepository {
    inner: SeaOrmAssignmentsRepository<DatabaseConnection>,
    fail_on_call: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl AssignmentsRepository for FlakyAssignmentsRepository {
    async fn upsert(&self, record: &CanonicalAssignmentRecord) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_call {
            anyhow::bail!("injected write failure");
        }
        self.inner.upsert(record).await
    }

    async fn count_active_for_supervisor(&self, supervisor_dpi: &str) -> anyhow::Result<u64> {
        self.inner.count_active_for_supervisor(supervisor_dpi).await
    }

    async fn active_supervisor_dpis(&self) -> anyhow::Result<Vec<String>> {
        self.inner.active_supervisor_dpis().await
    }
}

#[tokio::test]
async fn progress_is_monotonic_and_reaches_100_once() -> Result<()> {
    let db = create_test_db().await;
    let persons = Arc::new(SeaOrmPersonsRepository::new(db.clone()));
    let assignments = Arc::new(SeaOrmAssignmentsRepository::new(db.clone()));
    let job_levels = Arc::new(SeaOrmJobLevelsRepository::new(db.clone()));
    let service = ImportService::new(
        persons,
        assignments,
        job_levels,
        ImportConfig {
            user_chunk_size: 3,
            assignment_chunk_size: 2,
            chunk_pause: Duration::from_millis(0),
        },
    );

    let records: Vec<CanonicalUserRecord> =
        (1..=7).map(|i| user(&format!("100000000000{i}"))).collect();

    let progresses = Arc::new(Mutex::new(Vec::new()));
    let sink = progresses.clone();
    let on_progress = move |p: ImportProgress| sink.lock().unwrap().push(p);

    let outcome = service.write_users(&records, &on_progress).await;
    assert_eq!(outcome.success_count, 7);

    let seen = progresses.lock().unwrap();
    let currents: Vec<usize> = seen.iter().map(|p| p.current).collect();
    assert_eq!(currents, (1..=7).collect::<Vec<_>>());
    assert!(seen.windows(2).all(|w| w[0].percentage <= w[1].percentage));
    assert_eq!(seen.iter().filter(|p| p.percentage == 100).count(), 1);
    assert_eq!(seen.last().unwrap().total, 7);
    Ok(())
}

#[tokio::test]
async fn one_failing_write_does_not_abort_the_batch() -> Result<()> {
    let db = create_test_db().await;
    let persons: Arc<dyn PersonsRepository> =
        Arc::new(SeaOrmPersonsRepository::new(db.clone()));

    // Directory entries for the supervisor and the ten collaborators, so the
    // role cascade has something to act on.
    persons.upsert(&user("2000000000001")).await?;
    for i in 0..10 {
        persons.upsert(&user(&format!("10000000000{i:02}"))).await?;
    }

    let flaky = Arc::new(FlakyAssignmentsRepository {
        inner: SeaOrmAssignmentsRepository::new(db.clone()),
        fail_on_call: 4,
        calls: AtomicUsize::new(0),
    });
    let job_levels = Arc::new(SeaOrmJobLevelsRepository::new(db.clone()));
    let service = ImportService::new(
        persons,
        flaky,
        job_levels,
        ImportConfig {
            user_chunk_size: 50,
            assignment_chunk_size: 10,
            chunk_pause: Duration::from_millis(0),
        },
    );

    let records: Vec<CanonicalAssignmentRecord> = (0..10)
        .map(|i| pair(&format!("10000000000{i:02}"), "2000000000001"))
        .collect();

    let progresses = Arc::new(Mutex::new(Vec::new()));
    let sink = progresses.clone();
    let on_progress = move |p: ImportProgress| sink.lock().unwrap().push(p);

    let outcome = service.write_assignments(&records, &on_progress).await;

    assert_eq!(outcome.success_count, 9);
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].identity.starts_with("1000000000003"));
    assert!(outcome.failures[0].message.contains("injected"));

    // Records after the failed one were still attempted.
    assert_eq!(progresses.lock().unwrap().len(), 10);
    Ok(())
}

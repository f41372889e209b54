use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;

use org_directory::contract::client::OrgDirectoryApi;
use org_directory::contract::model::{ImportProgress, PersonRole, TemplateKind};
use org_directory::domain::error::ImportError;
use org_directory::domain::import::{ImportConfig, ImportService};
use org_directory::domain::repo::PersonsRepository;
use org_directory::domain::validate::CanonicalUserRecord;
use org_directory::gateways::local::OrgDirectoryLocalClient;
use org_directory::infra::storage::entity::{assignment, job_level, person};
use org_directory::infra::storage::migrations::Migrator;
use org_directory::infra::storage::repo::{
    SeaOrmAssignmentsRepository, SeaOrmJobLevelsRepository, SeaOrmPersonsRepository,
};

/// Create a fresh test database for each test
async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

fn create_service(db: &DatabaseConnection) -> ImportService {
    let persons = Arc::new(SeaOrmPersonsRepository::new(db.clone()));
    let assignments = Arc::new(SeaOrmAssignmentsRepository::new(db.clone()));
    let job_levels = Arc::new(SeaOrmJobLevelsRepository::new(db.clone()));
    ImportService::new(
        persons,
        assignments,
        job_levels,
        ImportConfig {
            user_chunk_size: 3,
            assignment_chunk_size: 2,
            chunk_pause: Duration::from_millis(0),
        },
    )
}

fn user(dpi: &str, level: &str) -> CanonicalUserRecord {
    CanonicalUserRecord {
        dpi: dpi.to_string(),
        given_name: "Test".to_string(),
        family_name: "Person".to_string(),
        birth_date: "01011980".to_string(),
        hire_date: None,
        job_level_code: level.to_string(),
        title: "Puesto".to_string(),
        area: "Area".to_string(),
        gender: None,
    }
}

async fn seed_person(db: &DatabaseConnection, dpi: &str, level: &str) {
    let repo = SeaOrmPersonsRepository::new(db.clone());
    repo.upsert(&user(dpi, level)).await.expect("seed person");
}

fn no_progress() -> impl Fn(ImportProgress) + Send + Sync {
    |_| {}
}

#[tokio::test]
async fn test_user_file_import_normalizes_and_persists() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db);

    let csv = "dpi,nombre,fechaNacimiento,fechaIngreso,nivel,cargo,area,genero\n\
               1000000000001,Ana Maria Lopez,15-03-1990,2021-06-01,tec,Tecnica de Campo,Obras,F\n\
               1000 0000 00002,Luis Paz,02111985,,Director Municipal,Director,Planificacion,M\n";

    let progress = no_progress();
    let report = service
        .import_users_file(csv.as_bytes(), "csv", &progress)
        .await?;

    assert_eq!(report.total, 2);
    assert_eq!(report.valid, 2);
    assert_eq!(report.invalid, 0);
    assert_eq!(report.outcome.success_count, 2);

    let ana = person::Entity::find_by_id("1000000000001")
        .one(&db)
        .await?
        .expect("ana persisted");
    assert_eq!(ana.given_name, "Ana");
    assert_eq!(ana.family_name, "Maria Lopez");
    assert_eq!(ana.birth_date, "15031990");
    assert_eq!(ana.job_level_code, "TEC");
    assert_eq!(ana.gender.as_deref(), Some("female"));
    assert!(ana.hire_date.is_some());

    // Whitespace identifier was normalized and flagged as a warning.
    let luis = person::Entity::find_by_id("1000000000002")
        .one(&db)
        .await?
        .expect("luis persisted");
    assert_eq!(luis.job_level_code, "DIR");
    assert!(report
        .row_issues
        .iter()
        .any(|i| i.row == 2 && i.warnings.iter().any(|w| w.contains("whitespace"))));

    Ok(())
}

#[tokio::test]
async fn test_reimport_is_idempotent() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db);

    let csv = "dpi,nombre,fechaNacimiento,nivel,cargo,area\n\
               1000000000001,Ana Lopez,15031990,TEC,Tecnica,Obras\n";

    let progress = no_progress();
    let first = service
        .import_users_file(csv.as_bytes(), "csv", &progress)
        .await?;
    let second = service
        .import_users_file(csv.as_bytes(), "csv", &progress)
        .await?;

    assert_eq!(first.outcome.success_count, 1);
    assert_eq!(second.outcome.success_count, 1);
    assert!(second.outcome.failures.is_empty());

    let count = person::Entity::find().count(&db).await?;
    assert_eq!(count, 1, "two identical runs must persist exactly one row");
    Ok(())
}

#[tokio::test]
async fn test_unreadable_file_aborts_before_any_write() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db);

    let progress = no_progress();
    let err = service
        .import_users_file(b"not really a workbook", "xlsx", &progress)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::File(_)));

    let count = person::Entity::find().count(&db).await?;
    assert_eq!(count, 0);
    Ok(())
}

#[tokio::test]
async fn test_assignment_end_to_end_with_duplicate_and_missing_supervisor() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db);

    seed_person(&db, "1000000000001", "TEC").await;
    seed_person(&db, "2000000000001", "DIR").await;

    // Row 1 valid new pair, row 2 duplicate of row 1, row 3 references a
    // supervisor that is not in the directory.
    let csv = "colaborador_dpi,jefe_dpi,grupo_id\n\
               1000000000001,2000000000001,G-01\n\
               1000000000001,2000000000001,G-01\n\
               1000000000001,9999999999999,\n";

    let progress = no_progress();
    let report = service
        .import_assignments_file(csv.as_bytes(), "csv", &progress)
        .await?;

    assert_eq!(report.total, 3);
    assert_eq!(report.valid, 2);
    assert_eq!(report.invalid, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.outcome.success_count, 2);
    assert!(report.outcome.failures.is_empty());

    // Idempotent pair upsert: one persisted assignment.
    let count = assignment::Entity::find().count(&db).await?;
    assert_eq!(count, 1);

    // The supervisor acquired an active assignment and was promoted.
    let persons = SeaOrmPersonsRepository::new(db.clone());
    let supervisor = persons.find_by_dpi("2000000000001").await?.unwrap();
    assert_eq!(supervisor.role, PersonRole::Supervisor);

    Ok(())
}

#[tokio::test]
async fn test_protected_roles_are_never_downgraded() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db);

    seed_person(&db, "1000000000001", "TEC").await;
    seed_person(&db, "2000000000001", "DIR").await;
    let persons = SeaOrmPersonsRepository::new(db.clone());
    persons
        .set_role("2000000000001", PersonRole::Admin)
        .await?;

    let csv = "colaborador_dpi,jefe_dpi\n1000000000001,2000000000001\n";
    let progress = no_progress();
    let report = service
        .import_assignments_file(csv.as_bytes(), "csv", &progress)
        .await?;
    assert_eq!(report.outcome.success_count, 1);

    let supervisor = persons.find_by_dpi("2000000000001").await?.unwrap();
    assert_eq!(supervisor.role, PersonRole::Admin);
    Ok(())
}

#[tokio::test]
async fn test_empty_job_level_directory_is_a_precondition_failure() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db);

    job_level::Entity::delete_many().exec(&db).await?;

    let csv = "dpi,nombre,fechaNacimiento,nivel,cargo,area\n\
               1000000000001,Ana Lopez,15031990,TEC,Tecnica,Obras\n";
    let progress = no_progress();
    let err = service
        .import_users_file(csv.as_bytes(), "csv", &progress)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Precondition { .. }));

    let count = person::Entity::find().count(&db).await?;
    assert_eq!(count, 0, "precondition failures abort before any write");
    Ok(())
}

#[tokio::test]
async fn test_bulk_role_recompute() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db);

    seed_person(&db, "1000000000001", "TEC").await;
    seed_person(&db, "2000000000001", "DIR").await;

    let csv = "colaborador_dpi,jefe_dpi\n1000000000001,2000000000001\n";
    let progress = no_progress();
    service
        .import_assignments_file(csv.as_bytes(), "csv", &progress)
        .await?;

    // Knock the role back down, then recompute in bulk.
    let persons = SeaOrmPersonsRepository::new(db.clone());
    persons
        .set_role("2000000000001", PersonRole::Collaborator)
        .await?;

    let promoted = service.recompute_supervisor_roles().await?;
    assert_eq!(promoted, 1);
    let supervisor = persons.find_by_dpi("2000000000001").await?.unwrap();
    assert_eq!(supervisor.role, PersonRole::Supervisor);

    // Idempotent: a second pass promotes nobody.
    assert_eq!(service.recompute_supervisor_roles().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_local_client_templates_and_imports() -> Result<()> {
    let db = create_test_db().await;
    let service = Arc::new(create_service(&db));
    let client = OrgDirectoryLocalClient::new(service);

    let users_template = client.render_template(TemplateKind::Users).await?;
    assert!(users_template.starts_with("dpi,nombre,fechaNacimiento"));

    let assignments_template = client.render_template(TemplateKind::Assignments).await?;
    assert!(assignments_template.starts_with("colaborador_dpi,jefe_dpi,grupo_id"));

    // The generated template is itself importable.
    let progresses = Arc::new(Mutex::new(Vec::new()));
    let sink = progresses.clone();
    let on_progress = move |p: ImportProgress| sink.lock().unwrap().push(p);
    let report = client
        .import_users(users_template.as_bytes(), "csv", &on_progress)
        .await?;
    assert_eq!(report.valid, 2);
    assert_eq!(report.outcome.success_count, 2);
    assert_eq!(progresses.lock().unwrap().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_text_serial_date_from_csv_export() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db);

    // 32947 is the spreadsheet serial for 1990-03-15; a CSV export of a
    // workbook hands it over as text.
    let csv = "dpi,nombre,fechaNacimiento,nivel,cargo,area\n\
               1000000000001,Ana Lopez,32947,TEC,Tecnica,Obras\n";
    let progress = no_progress();
    let report = service
        .import_users_file(csv.as_bytes(), "csv", &progress)
        .await?;
    assert_eq!(report.valid, 1);

    let ana = person::Entity::find_by_id("1000000000001")
        .one(&db)
        .await?
        .unwrap();
    assert_eq!(ana.birth_date, "15031990");
    Ok(())
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Persons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Persons::Dpi).string().not_null().primary_key())
                    .col(ColumnDef::new(Persons::GivenName).string().not_null())
                    .col(ColumnDef::new(Persons::FamilyName).string().not_null())
                    .col(ColumnDef::new(Persons::BirthDate).string().not_null())
                    .col(ColumnDef::new(Persons::HireDate).date().null())
                    .col(ColumnDef::new(Persons::JobLevelCode).string().not_null())
                    .col(ColumnDef::new(Persons::Title).string().not_null())
                    .col(ColumnDef::new(Persons::Area).string().not_null())
                    .col(ColumnDef::new(Persons::Gender).string().null())
                    .col(ColumnDef::new(Persons::Role).string().not_null())
                    .col(ColumnDef::new(Persons::Active).boolean().not_null())
                    .col(
                        ColumnDef::new(Persons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Persons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assignments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Assignments::CollaboratorDpi).string().not_null())
                    .col(ColumnDef::new(Assignments::SupervisorDpi).string().not_null())
                    .col(ColumnDef::new(Assignments::GroupId).string().null())
                    .col(ColumnDef::new(Assignments::Active).boolean().not_null())
                    .col(
                        ColumnDef::new(Assignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Natural uniqueness constraint the upsert conflicts on.
        manager
            .create_index(
                Index::create()
                    .name("idx_assignments_collaborator_supervisor")
                    .table(Assignments::Table)
                    .col(Assignments::CollaboratorDpi)
                    .col(Assignments::SupervisorDpi)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobLevels::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JobLevels::Code).string().not_null().primary_key())
                    .col(ColumnDef::new(JobLevels::Title).string().not_null())
                    .col(ColumnDef::new(JobLevels::Rank).integer().not_null())
                    .col(ColumnDef::new(JobLevels::Tier).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Seed the job-level reference directory.
        let mut seed = Query::insert()
            .into_table(JobLevels::Table)
            .columns([
                JobLevels::Code,
                JobLevels::Title,
                JobLevels::Rank,
                JobLevels::Tier,
            ])
            .to_owned();
        for (code, title, rank, tier) in [
            ("CON", "Concejal", 100, "council"),
            ("AL", "Alcalde", 90, "mayor"),
            ("DIR", "Director", 80, "director"),
            ("JD", "Jefe de Departamento", 70, "general"),
            ("PRO", "Profesional", 50, "general"),
            ("TEC", "Tecnico", 40, "general"),
            ("ASI", "Asistente", 30, "general"),
            ("OP", "Operativo", 20, "general"),
        ] {
            seed.values_panic([code.into(), title.into(), rank.into(), tier.into()]);
        }
        manager.exec_stmt(seed).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Persons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JobLevels::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Persons {
    Table,
    Dpi,
    GivenName,
    FamilyName,
    BirthDate,
    HireDate,
    JobLevelCode,
    Title,
    Area,
    Gender,
    Role,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assignments {
    Table,
    Id,
    CollaboratorDpi,
    SupervisorDpi,
    GroupId,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JobLevels {
    Table,
    Code,
    Title,
    Rank,
    Tier,
}

//! SeaORM-backed implementations of the domain ports.
//!
//! Each repository is generic over `C: ConnectionTrait`, so it can be built
//! with a `DatabaseConnection` or a transactional connection. Upserts go
//! through `OnConflict` on the natural key, which is what makes re-running
//! an import safe.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::contract::model::{JobLevel, Person, PersonRole};
use crate::domain::repo::{AssignmentsRepository, JobLevelsRepository, PersonsRepository};
use crate::domain::validate::{CanonicalAssignmentRecord, CanonicalUserRecord};
use crate::infra::storage::entity::{assignment, job_level, person};
use crate::infra::storage::mapper;

pub struct SeaOrmPersonsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmPersonsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> PersonsRepository for SeaOrmPersonsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_dpi(&self, dpi: &str) -> anyhow::Result<Option<Person>> {
        let found = person::Entity::find_by_id(dpi)
            .one(&self.conn)
            .await
            .context("find_by_dpi failed")?;
        Ok(found.map(mapper::person_to_contract))
    }

    async fn all_active(&self) -> anyhow::Result<Vec<Person>> {
        let rows = person::Entity::find()
            .filter(person::Column::Active.eq(true))
            .all(&self.conn)
            .await
            .context("all_active failed")?;
        Ok(rows.into_iter().map(mapper::person_to_contract).collect())
    }

    async fn upsert(&self, record: &CanonicalUserRecord) -> anyhow::Result<()> {
        let now = Utc::now();
        let model = person::ActiveModel {
            dpi: Set(record.dpi.clone()),
            given_name: Set(record.given_name.clone()),
            family_name: Set(record.family_name.clone()),
            birth_date: Set(record.birth_date.clone()),
            hire_date: Set(record.hire_date),
            job_level_code: Set(record.job_level_code.clone()),
            title: Set(record.title.clone()),
            area: Set(record.area.clone()),
            gender: Set(record.gender.map(|g| g.as_str().to_string())),
            role: Set(PersonRole::Collaborator.as_str().to_string()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // Conflict on the natural key updates the profile fields only; role,
        // active flag and created_at of an existing row are left alone.
        person::Entity::insert(model)
            .on_conflict(
                OnConflict::column(person::Column::Dpi)
                    .update_columns([
                        person::Column::GivenName,
                        person::Column::FamilyName,
                        person::Column::BirthDate,
                        person::Column::HireDate,
                        person::Column::JobLevelCode,
                        person::Column::Title,
                        person::Column::Area,
                        person::Column::Gender,
                        person::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("person upsert failed")?;
        Ok(())
    }

    async fn set_role(&self, dpi: &str, role: PersonRole) -> anyhow::Result<()> {
        let model = person::ActiveModel {
            dpi: Set(dpi.to_string()),
            role: Set(role.as_str().to_string()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        model.update(&self.conn).await.context("set_role failed")?;
        Ok(())
    }
}

pub struct SeaOrmAssignmentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmAssignmentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> AssignmentsRepository for SeaOrmAssignmentsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn upsert(&self, record: &CanonicalAssignmentRecord) -> anyhow::Result<()> {
        let now = Utc::now();
        let model = assignment::ActiveModel {
            id: Set(Uuid::new_v4()),
            collaborator_dpi: Set(record.collaborator_dpi.clone()),
            supervisor_dpi: Set(record.supervisor_dpi.clone()),
            group_id: Set(record.group_id.clone()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        assignment::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    assignment::Column::CollaboratorDpi,
                    assignment::Column::SupervisorDpi,
                ])
                .update_columns([
                    assignment::Column::GroupId,
                    assignment::Column::Active,
                    assignment::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("assignment upsert failed")?;
        Ok(())
    }

    async fn count_active_for_supervisor(&self, supervisor_dpi: &str) -> anyhow::Result<u64> {
        let count = assignment::Entity::find()
            .filter(assignment::Column::SupervisorDpi.eq(supervisor_dpi))
            .filter(assignment::Column::Active.eq(true))
            .count(&self.conn)
            .await
            .context("count_active_for_supervisor failed")?;
        Ok(count)
    }

    async fn active_supervisor_dpis(&self) -> anyhow::Result<Vec<String>> {
        let dpis: Vec<String> = assignment::Entity::find()
            .select_only()
            .column(assignment::Column::SupervisorDpi)
            .filter(assignment::Column::Active.eq(true))
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await
            .context("active_supervisor_dpis failed")?;
        Ok(dpis)
    }
}

pub struct SeaOrmJobLevelsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmJobLevelsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> JobLevelsRepository for SeaOrmJobLevelsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn all(&self) -> anyhow::Result<Vec<JobLevel>> {
        let rows = job_level::Entity::find()
            .all(&self.conn)
            .await
            .context("job level load failed")?;
        Ok(rows.into_iter().map(mapper::job_level_to_contract).collect())
    }
}

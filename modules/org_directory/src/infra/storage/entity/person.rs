use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "persons")]
pub struct Model {
    /// DPI-style national identifier, the natural key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub dpi: String,
    pub given_name: String,
    pub family_name: String,
    /// 8-digit DDMMYYYY.
    pub birth_date: String,
    pub hire_date: Option<NaiveDate>,
    pub job_level_code: String,
    pub title: String,
    pub area: String,
    pub gender: Option<String>,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

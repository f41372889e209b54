use crate::contract::model::{Gender, JobLevel, Person, PersonRole, Tier};
use crate::infra::storage::entity::{job_level, person};

/// Convert a person row to the contract model. Unknown role or gender
/// strings degrade to the safe defaults rather than failing a whole read.
pub fn person_to_contract(entity: person::Model) -> Person {
    Person {
        dpi: entity.dpi,
        given_name: entity.given_name,
        family_name: entity.family_name,
        birth_date: entity.birth_date,
        hire_date: entity.hire_date,
        job_level_code: entity.job_level_code,
        title: entity.title,
        area: entity.area,
        gender: entity.gender.as_deref().and_then(Gender::parse),
        role: PersonRole::parse(&entity.role).unwrap_or(PersonRole::Collaborator),
        active: entity.active,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}

pub fn job_level_to_contract(entity: job_level::Model) -> JobLevel {
    JobLevel {
        code: entity.code,
        title: entity.title,
        rank: entity.rank,
        tier: Tier::parse(&entity.tier).unwrap_or(Tier::General),
    }
}

pub mod columns;
pub mod error;
pub mod import;
pub mod normalize;
pub mod permission;
pub mod repo;
pub mod roles;
pub mod snapshot;
pub mod validate;

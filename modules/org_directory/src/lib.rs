//! Organizational directory module: spreadsheet/CSV import of employees and
//! supervisor-collaborator assignments into the central directory, with
//! format, referential and permission validation ahead of every write.
//!
//! Layering follows the module convention: `contract` holds the pure models
//! and the API other code consumes, `domain` holds the pipeline itself,
//! `infra` the SeaORM persistence, and `gateways` the in-process client.

pub mod contract;
pub mod domain;
pub mod gateways;
pub mod infra;

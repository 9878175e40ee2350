//! Route definitions for the vulnwatch API.

pub mod applications;
pub mod commits;
pub mod health;
pub mod ingestion;

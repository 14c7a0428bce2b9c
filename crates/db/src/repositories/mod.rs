//! Repositories, one per table family.
//!
//! All functions take a `&PgPool` and return `Result<_, sqlx::Error>`;
//! higher-level error mapping happens in `sentinel-engine`.

pub mod aggregate_repo;
pub mod alert_repo;
pub mod audit_repo;
pub mod expectation_repo;
pub mod occurrence_repo;
pub mod run_repo;
pub mod workflow_config_repo;

pub use aggregate_repo::StageAggregateRepo;
pub use alert_repo::AlertRepo;
pub use audit_repo::AuditLogRepo;
pub use expectation_repo::ExpectationRepo;
pub use occurrence_repo::OccurrenceRepo;
pub use run_repo::RunRepo;
pub use workflow_config_repo::WorkflowConfigRepo;

pub mod config;
pub mod database;
pub mod job_repository;
pub mod run_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use job_repository::FetchedJobRepository;
pub use run_repository::FetchRunRepository;

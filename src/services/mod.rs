// Service exports
pub mod postgres;
pub mod profile_store;

pub use postgres::{LikeOutcome, PostgresClient, PostgresError};
pub use profile_store::{ProfileStoreClient, ProfileStoreError};

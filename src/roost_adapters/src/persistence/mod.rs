pub mod dashmap_saga_journal;
pub mod hashmap_credential_store;
pub mod hashmap_recovery_store;
pub mod postgres_credential_store;
pub mod postgres_saga_journal;
pub mod redis_recovery_store;

pub use dashmap_saga_journal::DashMapSagaJournal;
pub use hashmap_credential_store::HashMapCredentialStore;
pub use hashmap_recovery_store::HashMapRecoveryStore;
pub use postgres_credential_store::PostgresCredentialStore;
pub use postgres_saga_journal::PostgresSagaJournal;
pub use redis_recovery_store::RedisRecoveryStore;

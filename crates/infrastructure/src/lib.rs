pub mod database;

pub use database::migrations::{MigrationStep, Migrator, StoreState};
pub use database::sqlite::{
    SqliteAttachmentRepository, SqliteNotificationRepository, SqliteTaskRepository,
};
pub use database::DatabaseManager;

use crate::database::error::DatabaseError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// Another writer already recorded this fingerprint.
    #[error("Announcement with fingerprint `{fingerprint}` already exists")]
    Conflict { fingerprint: String },

    #[error("Announcement with fingerprint `{fingerprint}` not found")]
    AnnouncementNotFound { fingerprint: String },

    #[error("DatabaseError: {0}")]
    DatabaseError(#[from] DatabaseError),
}

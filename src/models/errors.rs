use thiserror::Error;

/// Service-level errors surfaced to callers of the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Mapping error: {source}")]
    Mapping {
        #[from]
        source: MappingError,
    },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

impl ServiceError {
    /// No row matched a required lookup by id
    pub fn not_found(entity: &str, id: i64) -> Self {
        ServiceError::NotFound {
            message: format!("{} does not exist with this id: {}", entity, id),
        }
    }

    /// A listing query returned nothing
    pub fn empty(message: impl Into<String>) -> Self {
        ServiceError::NotFound {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError::BadRequest {
            message: message.into(),
        }
    }
}

/// Errors raised while translating between entities and DTOs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("{type_name} cannot be null")]
    NullInput { type_name: &'static str },

    #[error("Invalid reference in {type_name}: {message}")]
    InvalidReference {
        type_name: &'static str,
        message: String,
    },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Item not found")]
    NotFound,

    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Invalid stored data: {message}")]
    InvalidData { message: String },

    #[error("Value rejected by the database: {message}")]
    InvalidInput { message: String },

    #[error("Query failed: {message}")]
    QueryFailed { message: String },

    #[error("Migration failed: {source}")]
    Migration {
        #[from]
        source: sqlx::migrate::MigrateError,
    },

    #[error("Timeout occurred during operation")]
    Timeout,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::PoolTimedOut => RepositoryError::Timeout,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                RepositoryError::ConnectionFailed {
                    message: err.to_string(),
                }
            }
            sqlx::Error::Database(ref db_err)
                if db_err.is_foreign_key_violation()
                    || db_err.is_unique_violation()
                    || db_err.is_check_violation() =>
            {
                RepositoryError::ConstraintViolation {
                    message: db_err.message().to_string(),
                }
            }
            // SQLSTATE class 22: data exception (overflow, bad text representation, ...)
            sqlx::Error::Database(ref db_err)
                if db_err.code().is_some_and(|code| code.starts_with("22")) =>
            {
                RepositoryError::InvalidInput {
                    message: db_err.message().to_string(),
                }
            }
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_) => RepositoryError::InvalidData {
                message: err.to_string(),
            },
            other => RepositoryError::QueryFailed {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for mapper operations
pub type MappingResult<T> = Result<T, MappingError>;

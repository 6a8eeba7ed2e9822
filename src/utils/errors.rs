use sqlx::error::ErrorKind;
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

/// Failures surfaced by the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Entity absent, or owned by a different collector. Cross-tenant
    /// access gets the same answer as a missing row so one tenant can
    /// never confirm the existence of another tenant's data.
    #[error("{0}")]
    NotFound(String),
    /// Business-rule violation; the message names the offending values.
    #[error("{0}")]
    InvalidInput(String),
    /// Illegal state-machine transition, naming the current status.
    #[error("Cannot {action} {entity} with status {status}")]
    StateConflict {
        action: &'static str,
        entity: &'static str,
        status: String,
    },
    #[error("Too many submissions. Try again later.")]
    RateLimited,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Plain "<what> not found".
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }
}

/// True when a database error is a duplicate-key violation.
///
/// MySQL reports duplicate keys as error 1062, which sqlx folds into
/// `ErrorKind::UniqueViolation`. Foreign-key and NOT NULL failures share
/// SQLSTATE 23000 with duplicates, so classification never rests on the
/// SQLSTATE alone.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.kind(), ErrorKind::UniqueViolation)
                || db
                    .try_downcast_ref::<MySqlDatabaseError>()
                    .map(|e| e.number() == 1062)
                    .unwrap_or(false)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_conflict_message_names_status() {
        let err = ServiceError::StateConflict {
            action: "confirm",
            entity: "transaction",
            status: "CONFIRMED".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot confirm transaction with status CONFIRMED"
        );
    }

    #[test]
    fn test_not_found_helper_message() {
        assert_eq!(
            ServiceError::not_found("Payout").to_string(),
            "Payout not found"
        );
    }

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    // Minimal DatabaseError carrying SQLSTATE 23000, the class MySQL
    // uses for every integrity violation
    #[derive(Debug)]
    struct IntegrityError {
        unique: bool,
    }

    impl std::fmt::Display for IntegrityError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "integrity constraint violation")
        }
    }

    impl std::error::Error for IntegrityError {}

    impl sqlx::error::DatabaseError for IntegrityError {
        fn message(&self) -> &str {
            "integrity constraint violation"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some("23000".into())
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::ForeignKeyViolation
            }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_unique_kind_is_a_duplicate() {
        let err = sqlx::Error::Database(Box::new(IntegrityError { unique: true }));
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn test_sqlstate_23000_alone_is_not_a_duplicate() {
        let err = sqlx::Error::Database(Box::new(IntegrityError { unique: false }));
        assert!(!is_unique_violation(&err));
    }
}

pub mod errors;
pub mod ratelimit;
pub mod session;

pub use errors::{is_unique_violation, ServiceError, ServiceResult};
pub use ratelimit::{check_submission_allowed, record_submission};

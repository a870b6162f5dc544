use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid product type: {0}")]
    InvalidCategory(String),

    #[error("An open reception already exists for this pickup point")]
    ConflictAlreadyOpen,

    #[error("No open reception for this pickup point")]
    NoOpenReception,

    #[error("Open reception has no products")]
    EmptyReception,

    #[error("Persistence failure: {0}")]
    Persistence(anyhow::Error),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Persistence(anyhow::Error::new(err))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            e @ (ServiceError::InvalidLocation(_)
            | ServiceError::InvalidCategory(_)
            | ServiceError::NoOpenReception
            | ServiceError::EmptyReception
            | ServiceError::InvalidRole(_)) => AppError::BadRequest(anyhow::anyhow!(e.to_string())),
            e @ (ServiceError::ConflictAlreadyOpen | ServiceError::UserAlreadyExists) => {
                AppError::Conflict(anyhow::anyhow!(e.to_string()))
            }
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::InvalidToken => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
            }
            ServiceError::Persistence(e) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

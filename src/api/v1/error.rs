use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(error) = err.find::<ApiError>() {
        error.clone()
    } else if err.is_not_found() {
        ApiError::new(ApiErrorCode::NotFound, "no such route")
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::new(ApiErrorCode::InvalidArgument, e.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiError::new(ApiErrorCode::MethodNotAllowed, "method not allowed")
    } else {
        warn!("unhandled rejection: {:?}", err);
        ApiError::new(ApiErrorCode::InternalError, "unhandled error")
    };

    let status = error.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Logs the cause and hides it from the caller.
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiError {
        warn!("Internal error: {}", error);
        ApiError::new(ApiErrorCode::InternalError, ApiErrorCode::InternalError.to_string())
    }
}

impl reject::Reject for ApiError {}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Not found")]
    NotFound,
    #[error("Conflict")]
    Conflict,
    #[error("Invalid state")]
    InvalidState,
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::Conflict | ApiErrorCode::InvalidState | ApiErrorCode::UsernameTaken => {
                StatusCode::CONFLICT
            }
            ApiErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidToken | ApiErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RelationError> for ApiError {
    fn from(error: RelationError) -> Self {
        let message = error.to_string();
        match error {
            RelationError::NotFound(_) => ApiError::new(ApiErrorCode::NotFound, message),
            RelationError::Conflict(_) => ApiError::new(ApiErrorCode::Conflict, message),
            RelationError::InvalidState(_) => ApiError::new(ApiErrorCode::InvalidState, message),
            RelationError::InvalidArgument(_) => {
                ApiError::new(ApiErrorCode::InvalidArgument, message)
            }
            RelationError::Store(e) => ApiError::internal(e),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(error: UserError) -> Self {
        let message = error.to_string();
        match error {
            UserError::NotFound => ApiError::new(ApiErrorCode::NotFound, message),
            UserError::InvalidUsername(_) => ApiError::new(ApiErrorCode::InvalidArgument, message),
            UserError::UsernameTaken => ApiError::new(ApiErrorCode::UsernameTaken, message),
            UserError::Store(e) => ApiError::internal(e),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::TokenInvalid => {
                ApiError::new(ApiErrorCode::InvalidToken, error.to_string())
            }
            IdentityError::TokenExpired => {
                ApiError::new(ApiErrorCode::TokenExpired, error.to_string())
            }
            IdentityError::InternalError(e) => ApiError::internal(e),
        }
    }
}

use axum::extract::FromRequest;

use crate::error::ServiceError;

/// `axum::Json` that reports any rejected body as
/// [`ServiceError::Validation`], giving it the usual `{"detail": ...}` reply.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct ApiJson<T>(pub T);

use crate::error::AppError;
use axum::extract::FromRequest;

/// `Json` whose rejections answer with the gateway's error body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

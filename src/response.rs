use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    HttpRequest, HttpResponse,
};
use log::{error, warn};
use serde::Serialize;

use crate::error::AppError;

#[derive(Serialize)]
pub struct ResponseDto<T: Serialize> {
    pub data: Option<T>,
    pub code: i32,
    pub msg: String,
}

impl<T: Serialize> ResponseDto<T> {
    pub fn success(data: Option<T>) -> Self {
        Self {
            data,
            code: 0,
            msg: "".to_string(),
        }
    }
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let app_err = match err {
        JsonPayloadError::ContentType => AppError::validation("body", "content type must be application/json"),
        JsonPayloadError::Deserialize(e) => AppError::validation("body", e.to_string()),
        _ => AppError::validation("body", "unreadable request body"),
    };
    app_err.into()
}

// Every query string in this service carries a single comment id.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let app_err = match err {
        QueryPayloadError::Deserialize(e) => AppError::validation("id", e.to_string()),
        _ => AppError::validation("id", "unreadable query string"),
    };
    app_err.into()
}

// Errors are logged here and nowhere below: the service layer only returns them.
pub fn response_from_error(err: &AppError) -> HttpResponse {
    match err.code() {
        5 | 99 => error!("request failed: {:?}", err),
        _ => warn!("request rejected: {}", err),
    }
    HttpResponse::Ok().json(ResponseDto::<()> {
        data: None,
        code: err.code(),
        msg: err.msg(),
    })
}

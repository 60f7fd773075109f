use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

use crate::errors::ApiError;

// Envelope shared by every endpoint, success or failure
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub code: u16,
    pub result: Option<T>,
    pub error: Option<ApiError>,
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::OK, data)
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::CREATED, data)
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse {
        status: "SUCCESS".to_string(),
        code: status.as_u16(),
        result: Some(data),
        error: None,
    })
}

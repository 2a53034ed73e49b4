use std::fmt::Display;

use axum::{http::StatusCode, Json};
use serde::{ser::SerializeStruct, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::errors::Error;

/// Generic toast title used for every failure.
pub const ERROR_TITLE: &str = "เกิดข้อผิดพลาด";

/// Body of every answer: `{status, code, data}`.
#[derive(Debug)]
pub struct Response {
    /// HTTP status; `status` carries the application code.
    code: StatusCode,
    status: i32,
    data: Value,
}

impl axum::response::IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        (self.code, Json(self)).into_response()
    }
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("Response", 3)?;
        s.serialize_field("status", &self.status)?;
        s.serialize_field("code", &self.code.as_u16())?;
        s.serialize_field("data", &self.data)?;
        s.end()
    }
}

fn toast(description: impl Display) -> Value {
    json!({
        "title": ERROR_TITLE,
        "description": description.to_string()
    })
}

impl Response {
    pub fn new(code: StatusCode, status: i32, data: Value) -> Response {
        Self { code, status, data }
    }
    pub fn ok(data: Value) -> Self {
        Self {
            code: StatusCode::OK,
            status: 0,
            data,
        }
    }
    pub fn empty() -> Self {
        Self {
            code: StatusCode::OK,
            status: 0,
            data: json!("OK"),
        }
    }
    /// Status -1.
    pub fn internal_server_error(e: impl Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, -1, toast(e))
    }
    /// Logs the underlying error and answers with the generic toast.
    pub fn failed(e: impl Display, description: &str) -> Self {
        error!("{description}: {e}");
        Self::internal_server_error(description)
    }
    /// Status 1: the body could not be read.
    pub fn invalid_format(e: impl Display) -> Self {
        Self::new(StatusCode::OK, 1, toast(e))
    }
    /// Status 2.
    pub fn not_exist(e: impl Display) -> Self {
        Self::new(StatusCode::OK, 2, toast(e))
    }
    /// Status 7: a value outside its allowed set.
    pub fn invalid_value(e: impl Display) -> Self {
        Self::new(StatusCode::OK, 7, toast(e))
    }
    /// Status 8: the client must repeat the request with `confirm=true`.
    pub fn confirm_required(e: impl Display) -> Self {
        Self::new(StatusCode::OK, 8, toast(e))
    }
    pub fn code(&self) -> StatusCode {
        self.code
    }
    pub fn status(&self) -> i32 {
        self.status
    }
    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl From<Error> for Response {
    fn from(value: Error) -> Self {
        match value {
            Error::Validation(fields) => Self::new(
                StatusCode::OK,
                1,
                json!({
                    "title": "ข้อมูลไม่ครบถ้วน",
                    "description": "กรุณากรอกข้อมูลในช่องที่จำเป็นทั้งหมด",
                    "fields": fields
                }),
            ),
            Error::Json(e) => Self::invalid_format(e),
            Error::NotFound(what) => Self::not_exist(format!("ไม่พบข้อมูล {what}")),
            Error::InvalidValue(e) => Self::invalid_value(e),
            Error::ConfirmRequired(e) => Self::confirm_required(e),
            e => Self::failed(e, "ไม่สามารถดำเนินการได้"),
        }
    }
}

impl From<serde_json::Error> for Response {
    fn from(value: serde_json::Error) -> Self {
        Response::invalid_format(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FieldError;

    #[test]
    fn validation_error_lists_fields() {
        let resp = Response::from(Error::Validation(vec![FieldError::new(
            "jobName",
            "กรุณาระบุชื่องาน",
        )]));
        assert_eq!(resp.status(), 1);
        assert_eq!(resp.data()["fields"][0]["field"], "jobName");
    }

    #[test]
    fn backend_errors_collapse_to_generic_toast() {
        let resp = Response::failed("connection refused", "ไม่สามารถดึงข้อมูลลูกค้าได้");
        assert_eq!(resp.code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.data()["title"], ERROR_TITLE);
        assert_eq!(resp.data()["description"], "ไม่สามารถดึงข้อมูลลูกค้าได้");
    }
}

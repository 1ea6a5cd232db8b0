use actix_web::error::{Error, InternalError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde_derive::Serialize;

#[derive(Serialize)]
pub(crate) struct JsonResponse<T> {
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) item: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) list: Option<Vec<T>>,
}

pub(crate) struct JsonResponseBuilder<T>
where
    T: serde::Serialize,
{
    message: String,
    id: Option<i32>,
    item: Option<T>,
    list: Option<Vec<T>>,
}

impl<T> Default for JsonResponseBuilder<T>
where
    T: serde::Serialize,
{
    fn default() -> Self {
        Self {
            message: String::new(),
            id: None,
            item: None,
            list: None,
        }
    }
}

impl<T> JsonResponseBuilder<T>
where
    T: serde::Serialize,
{
    pub(crate) fn set_msg<I: Into<String>>(mut self, msg: I) -> Self {
        self.message = msg.into();
        self
    }

    pub(crate) fn set_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub(crate) fn set_item(mut self, item: T) -> Self {
        self.item = Some(item);
        self
    }

    pub(crate) fn set_list(mut self, list: Vec<T>) -> Self {
        self.list = Some(list);
        self
    }

    fn to_json_response(self) -> JsonResponse<T> {
        JsonResponse {
            message: self.message,
            id: self.id,
            item: self.item,
            list: self.list,
        }
    }

    pub(crate) fn to_string(self) -> String {
        let response = self.to_json_response();
        serde_json::to_string(&response).unwrap_or_else(|_| response.message)
    }

    pub(crate) fn ok<I: Into<String>>(self, msg: I) -> web::Json<JsonResponse<T>> {
        web::Json(self.set_msg(msg).to_json_response())
    }

    pub(crate) fn error<I: Into<String>>(self, msg: I, status: StatusCode) -> Error {
        let response = self.set_msg(msg).to_json_response();
        InternalError::from_response("", HttpResponse::build(status).json(response)).into()
    }

    pub(crate) fn bad_request<I: Into<String>>(self, msg: I) -> Error {
        self.error(msg, StatusCode::BAD_REQUEST)
    }

    pub(crate) fn form_error<I: Into<String>>(self, msg: I) -> Error {
        self.error(msg, StatusCode::UNPROCESSABLE_ENTITY)
    }

    pub(crate) fn not_found<I: Into<String>>(self, msg: I) -> Error {
        self.error(msg, StatusCode::NOT_FOUND)
    }

    pub(crate) fn forbidden<I: Into<String>>(self, msg: I) -> Error {
        self.error(msg, StatusCode::FORBIDDEN)
    }

    pub(crate) fn internal_server_error<I: Into<String>>(self, msg: I) -> Error {
        self.error(msg, StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl<T> JsonResponse<T>
where
    T: serde::Serialize,
{
    pub(crate) fn build() -> JsonResponseBuilder<T> {
        JsonResponseBuilder::default()
    }
}

impl<T> From<T> for JsonResponseBuilder<T>
where
    T: serde::Serialize,
{
    fn from(value: T) -> Self {
        JsonResponseBuilder::default().set_item(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_not_serialized() {
        let body = JsonResponse::<i32>::build().set_id(4).to_string();
        assert_eq!(r#"{"message":"","id":4}"#, body);
    }

    #[test]
    fn error_carries_status() {
        let err = JsonResponse::<i32>::build().not_found("form not found");
        assert_eq!(StatusCode::NOT_FOUND, err.as_response_error().status_code());
    }
}

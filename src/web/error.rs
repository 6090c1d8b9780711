use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::error::PipelineError;
use crate::web::templates::error_page;

/// Every failure reaches the caller as an HTML page with a status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Html(error_page(status.as_u16(), &self.to_string()))).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(msg) => ApiError::BadRequest(msg),
            e @ PipelineError::Authentication(_) => ApiError::BadGateway(e.to_string()),
            e @ PipelineError::Normalization(_) => ApiError::BadGateway(e.to_string()),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<handlebars::RenderError> for ApiError {
    fn from(err: handlebars::RenderError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn pipeline_errors_map_to_statuses() {
        let auth = PipelineError::Authentication(ClientError::Timeout {
            operation: "az login",
            limit: std::time::Duration::from_secs(120),
        });
        let api: ApiError = auth.into();
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        assert!(api.to_string().contains("az login timed out"));

        let api: ApiError = PipelineError::InvalidInput("start_time is required".into()).into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn response_carries_body() {
        let resp = ApiError::BadRequest("nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

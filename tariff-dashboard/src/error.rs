use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tariff_client::DataAccessError;

use crate::web::pages::ErrorPage;

#[derive(thiserror::Error, Debug)]
pub enum DashboardError {
    #[error("No data found for '{0}'")]
    VillageNotFound(String),
    #[error("No competitor comparison available for '{0}'")]
    ComparisonUnavailable(String),
    #[error("data access error: {0}")]
    DataAccess(#[from] DataAccessError),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("chart error: {0}")]
    Chart(String),
    #[error("export error: {0}")]
    Export(String),
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::VillageNotFound(_) | DashboardError::ComparisonUnavailable(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<csv::Error> for DashboardError {
    fn from(e: csv::Error) -> Self {
        DashboardError::Export(e.to_string())
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(error = %message, "render pass failed");
        } else {
            tracing::info!(error = %message, "render pass ended early");
        }

        let page = ErrorPage {
            title: status.canonical_reason().unwrap_or("Error"),
            message: &message,
        };
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to render error page");
                (status, message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_404_with_village_in_message() {
        let e = DashboardError::VillageNotFound("Classic Res".to_string());
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.to_string(), "No data found for 'Classic Res'");
    }

    #[test]
    fn infrastructure_failures_are_500() {
        let e = DashboardError::Chart("backend closed".to_string());
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let resp = e.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Error responses for dispatch failures.
//!
//! # Design Decisions
//! - Unmatched paths are a client-side miss: 404
//! - A matched service with no live replica is a server-side failure: 503

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::routing::DispatchError;

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NoMatchingService(_) => StatusCode::NOT_FOUND,
            DispatchError::NoServersAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = match self {
            DispatchError::NoMatchingService(_) => "No matching service found",
            DispatchError::NoServersAvailable(_) => "No servers available",
        };
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = DispatchError::NoMatchingService("/x".into()).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let unavailable = DispatchError::NoServersAvailable("api".into()).into_response();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

//! Landing page handler.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Response};
use wps_protocol::LandingPage;

use super::json_response;
use crate::state::AppState;

/// GET / - Landing page
pub async fn landing_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let landing = LandingPage::new(
        "Climate indices processing service",
        "OGC API - Processes exposing climate indicators computed over gridded daily datasets",
        &state.config.base_url,
    );
    json_response(StatusCode::OK, &landing)
}

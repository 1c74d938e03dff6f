//! Resource listing and reads.
//!
//! `GET /api/resources/{scheme}/{path}` reads the resource `scheme://path`.

use super::dispatch_error;
use axum::{Json, extract::Path, http::StatusCode};
use serde::Serialize;
use toolhub_core::resources::{read_resource, resource_templates};
use toolhub_types::{ResourceContent, ResourceTemplate};

#[derive(Serialize)]
pub struct ResourceListResponse {
    #[serde(rename = "resourceTemplates")]
    pub resource_templates: Vec<ResourceTemplate>,
}

pub async fn list() -> Json<ResourceListResponse> {
    Json(ResourceListResponse {
        resource_templates: resource_templates(),
    })
}

pub async fn read(
    Path((scheme, path)): Path<(String, String)>,
) -> Result<Json<ResourceContent>, (StatusCode, String)> {
    let uri = format!("{scheme}://{path}");
    read_resource(&uri)
        .map(Json)
        .map_err(|e| dispatch_error(&format!("Resource {uri}"), e))
}

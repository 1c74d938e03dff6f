//! Readable resources addressed by URI.

use crate::ToolError;
use crate::tools::ToolResult;
use toolhub_types::{ResourceContent, ResourceTemplate};
use tracing::debug;

const GREETING_SCHEME: &str = "greeting";
const TEXT_PLAIN: &str = "text/plain";

pub fn greeting(name: &str) -> String {
    format!("Hello, {name}!")
}

/// Templates of every resource that [`read_resource`] can serve.
pub fn resource_templates() -> Vec<ResourceTemplate> {
    vec![ResourceTemplate {
        uri_template: format!("{GREETING_SCHEME}://{{name}}"),
        name: "greeting".to_string(),
        description: "A personalized greeting".to_string(),
        mime_type: TEXT_PLAIN.to_string(),
    }]
}

/// Read the resource at `uri`.
pub fn read_resource(uri: &str) -> ToolResult<ResourceContent> {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Err(ToolError::UnknownResource(uri.to_string()));
    };
    let text = match scheme {
        GREETING_SCHEME if !rest.is_empty() => greeting(rest),
        GREETING_SCHEME => {
            return Err(ToolError::InvalidArg {
                name: "name".to_string(),
                reason: "greeting needs a name".to_string(),
            });
        }
        _ => return Err(ToolError::UnknownResource(uri.to_string())),
    };
    debug!(target: "toolhub::tools", "Read resource {}", uri);
    Ok(ResourceContent {
        uri: uri.to_string(),
        mime_type: TEXT_PLAIN.to_string(),
        text,
    })
}

//! Prompt templates.
//!
//! Prompts: greet_user

use crate::ToolError;
use crate::tools::{ToolResult, get_optional_string, get_string_arg};
use serde_json::{Map, Value as JsonValue};
use toolhub_types::{PromptArgument, PromptDef};
use tracing::debug;

const GREET_USER: &str = "greet_user";

/// Tone of a greeting prompt. Unrecognised styles fall back to friendly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GreetingStyle {
    #[default]
    Friendly,
    Formal,
    Casual,
}

impl GreetingStyle {
    pub fn parse(style: &str) -> Self {
        match style.trim().to_lowercase().as_str() {
            "formal" => Self::Formal,
            "casual" => Self::Casual,
            _ => Self::Friendly,
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::Friendly => "Please write a warm, friendly greeting",
            Self::Formal => "Please write a formal, professional greeting",
            Self::Casual => "Please write a casual, relaxed greeting",
        }
    }
}

pub fn greet_user(name: &str, style: GreetingStyle) -> String {
    format!("{} for someone named {}.", style.instruction(), name)
}

/// Registry of the prompt templates.
pub struct PromptRegistry {
    prompts: Vec<PromptDef>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self {
            prompts: vec![PromptDef {
                name: GREET_USER.to_string(),
                description: "Generate a greeting prompt for someone.".to_string(),
                arguments: vec![
                    PromptArgument::new("name", "Name of the person to greet", true),
                    PromptArgument::new(
                        "style",
                        "Greeting style: friendly (default), formal or casual",
                        false,
                    ),
                ],
            }],
        }
    }

    pub fn prompts(&self) -> &[PromptDef] {
        &self.prompts
    }

    /// Render a prompt to its text.
    pub fn render(&self, name: &str, args: &Map<String, JsonValue>) -> ToolResult<String> {
        match name {
            GREET_USER => {
                let person = get_string_arg(args, "name")?;
                let style = get_optional_string(args, "style")?
                    .map(|s| GreetingStyle::parse(&s))
                    .unwrap_or_default();
                debug!(target: "toolhub::tools", "Rendering {} ({:?}) for {}", name, style, person);
                Ok(greet_user(&person, style))
            }
            _ => Err(ToolError::UnknownPrompt(name.to_string())),
        }
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Prompt templates for the chat model, overridable from a YAML file.
//!
//! The built-in prompts work out of the box; dropping a `prompts.yaml`
//! next to the binary replaces any subset of them. A malformed file is
//! ignored with a warning rather than aborting the run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Placeholder replaced by article text when a prompt is rendered.
pub const TEXT_SLOT: &str = "{text}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptBook {
    pub system: String,
    pub summarize: String,
}

impl Default for PromptBook {
    fn default() -> Self {
        PromptBook {
            system: "You are a concise news editor. Reply with plain text only, \
                     no markdown and no preamble."
                .to_string(),
            summarize: "Summarize the following news article in 2-3 sentences. \
                        Keep the key facts, names and figures:\n\n{text}"
                .to_string(),
        }
    }
}

impl PromptBook {
    /// Load prompt overrides from `path`, falling back to the built-in
    /// prompts when the file is absent or unusable.
    pub fn load_or_default(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no prompt file, using built-ins");
                return PromptBook::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable prompt file, using built-ins");
                return PromptBook::default();
            }
        };
        match serde_yaml::from_str(&raw) {
            Ok(book) => book,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed prompt file, using built-ins");
                PromptBook::default()
            }
        }
    }

    pub fn render_summarize(&self, text: &str) -> String {
        self.summarize.replace(TEXT_SLOT, text)
    }
}

//! Command templates
//!
//! The recovery module stores its accepted commands as token arrays such as
//! `["Accept", "guardian", "request", "for", "{ethAddr}"]`. The relayer
//! reconstructs the same string from the request parameters and rejects any
//! mismatch, so rendering must be exact.

use crate::error::{Error, Result};
use crate::gateway::ChainGateway;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Placeholders understood by the relayer's command parser.
pub const RECOGNIZED_PLACEHOLDERS: &[&str] =
    &["{ethAddr}", "{string}", "{uint}", "{int}", "{decimals}"];

/// Placeholder holding the wallet address.
pub const ETH_ADDR_PLACEHOLDER: &str = "{ethAddr}";

/// One on-chain command template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    tokens: Vec<String>,
}

impl CommandTemplate {
    /// Wrap a token sequence
    #[must_use]
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Split a space separated template string into tokens
    #[must_use]
    pub fn parse(template: &str) -> Self {
        Self {
            tokens: template.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Template tokens in order
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Recognized placeholders in token order
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .filter(|t| RECOGNIZED_PLACEHOLDERS.contains(t))
    }
}

/// Ordered templates as returned by the module. The index is what the
/// relayer receives as `template_idx`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSet {
    templates: Vec<CommandTemplate>,
}

impl TemplateSet {
    /// Wrap a list of templates
    #[must_use]
    pub fn new(templates: Vec<CommandTemplate>) -> Self {
        Self { templates }
    }

    /// Build from the raw `string[][]` the module returns
    #[must_use]
    pub fn from_raw(raw: Vec<Vec<String>>) -> Self {
        Self {
            templates: raw.into_iter().map(CommandTemplate::new).collect(),
        }
    }

    /// Number of templates
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the module returned no templates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template at `idx`
    pub fn get(&self, idx: u64) -> Result<&CommandTemplate> {
        usize::try_from(idx)
            .ok()
            .and_then(|i| self.templates.get(i))
            .ok_or_else(|| {
                Error::TemplateFormat(format!(
                    "template index {} out of range ({} templates)",
                    idx,
                    self.templates.len()
                ))
            })
    }
}

/// Values for template placeholders, keyed by placeholder token.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    values: HashMap<String, String>,
}

impl Substitutions {
    /// Empty substitution set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitutions with only the wallet address slot filled
    #[must_use]
    pub fn eth_addr(value: impl Into<String>) -> Self {
        Self::new().with(ETH_ADDR_PLACEHOLDER, value)
    }

    /// Set the value for a placeholder
    #[must_use]
    pub fn with(mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(placeholder.into(), value.into());
        self
    }

    fn get(&self, placeholder: &str) -> Option<&str> {
        self.values.get(placeholder).map(String::as_str)
    }
}

/// Read the acceptance templates of `module`. Never cached.
pub async fn fetch_acceptance_templates(
    chain: &dyn ChainGateway,
    module: Address,
) -> Result<TemplateSet> {
    let templates = chain.acceptance_command_templates(module).await?;
    debug!(count = templates.len(), "fetched acceptance templates");
    Ok(templates)
}

/// Read the recovery templates of `module`. Never cached.
pub async fn fetch_recovery_templates(
    chain: &dyn ChainGateway,
    module: Address,
) -> Result<TemplateSet> {
    let templates = chain.recovery_command_templates(module).await?;
    debug!(count = templates.len(), "fetched recovery templates");
    Ok(templates)
}

/// Render a template into the exact command string the relayer expects.
///
/// The template must contain exactly one recognized placeholder. Tokens are
/// joined by single spaces and whitespace inside tokens is collapsed.
pub fn render_command(template: &CommandTemplate, substitutions: &Substitutions) -> Result<String> {
    let placeholders: Vec<&str> = template.placeholders().collect();
    let slot = match placeholders.as_slice() {
        [only] => *only,
        [] => {
            return Err(Error::TemplateFormat(
                "template has no recognized placeholder".to_string(),
            ))
        }
        many => {
            return Err(Error::TemplateFormat(format!(
                "template has {} placeholders ({}), expected exactly one",
                many.len(),
                many.join(", ")
            )))
        }
    };

    let value = substitutions
        .get(slot)
        .ok_or_else(|| Error::TemplateFormat(format!("no value supplied for {}", slot)))?;

    let rendered = template
        .tokens()
        .iter()
        .map(|token| if token == slot { value } else { token.as_str() })
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    Ok(rendered)
}

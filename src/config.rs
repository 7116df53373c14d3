//! Form generation configuration
//!
//! [`FormConfig`] holds the presentation options shared by every run of a
//! builder; [`FormRequest`] holds the data of one run.

use crate::documents::Element;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default stylesheet referenced by the XHTML wrapper
pub const DEFAULT_CSS_STYLE: &str = "style.css";

/// Default number of choices from which a list is considered long
pub const DEFAULT_LONG_LIST_SIZE: usize = 6;

/// Default submission method
pub const SUBMIT_METHOD_POST: &str = "post";

/// Presentation options for generated forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FormConfig {
    /// Stylesheet reference
    pub css_style: String,

    /// Choice count from which a single-choice control is a long list
    pub select_one_long_list_size: usize,

    /// Appearance of short single-choice controls
    pub select_one_appearance_short: String,

    /// Appearance of long single-choice controls
    pub select_one_appearance_long: String,

    /// Choice count from which a multi-choice control is a long list
    pub select_many_long_list_size: usize,

    /// Appearance of short multi-choice controls
    pub select_many_appearance_short: String,

    /// Appearance of long multi-choice controls
    pub select_many_appearance_long: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            css_style: DEFAULT_CSS_STYLE.to_string(),
            select_one_long_list_size: DEFAULT_LONG_LIST_SIZE,
            select_one_appearance_short: "full".to_string(),
            select_one_appearance_long: "minimal".to_string(),
            select_many_long_list_size: DEFAULT_LONG_LIST_SIZE,
            select_many_appearance_short: "full".to_string(),
            select_many_appearance_long: "compact".to_string(),
        }
    }
}

impl FormConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that the thresholds are usable
    pub fn check(&self) -> Result<()> {
        if self.select_one_long_list_size == 0 {
            return Err(Error::Config(
                "selectOneLongListSize must be greater than 0".to_string(),
            ));
        }
        if self.select_many_long_list_size == 0 {
            return Err(Error::Config(
                "selectManyLongListSize must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a single-choice list of `count` items is long
    pub fn is_long_select_one(&self, count: usize) -> bool {
        count >= self.select_one_long_list_size
    }

    /// Appearance hint for a single-choice control with `count` choices
    pub fn select_one_appearance(&self, count: usize) -> &str {
        if self.is_long_select_one(count) {
            &self.select_one_appearance_long
        } else {
            &self.select_one_appearance_short
        }
    }

    /// Appearance hint for a multi-choice control with `count` choices
    pub fn select_many_appearance(&self, count: usize) -> &str {
        if count >= self.select_many_long_list_size {
            &self.select_many_appearance_long
        } else {
            &self.select_many_appearance_short
        }
    }
}

/// Input of one synthesis run
#[derive(Debug, Clone, Default)]
pub struct FormRequest {
    /// Local name of the root element, looked up in the target namespace
    pub root_element: String,
    /// Instance document to prefill the form with
    pub instance: Option<Element>,
    /// Submission action (relative to `base` when given)
    pub action: Option<String>,
    /// Submission method, `post` when unset
    pub method: Option<String>,
    /// Base URI, recorded as `xml:base` and prefixed to action and schema
    pub base: Option<String>,
    /// Schema location recorded on the model
    pub schema_uri: Option<String>,
}

impl FormRequest {
    /// Request a form for the given root element
    pub fn new(root_element: impl Into<String>) -> Self {
        Self {
            root_element: root_element.into(),
            ..Self::default()
        }
    }

    /// Prefill with an instance document
    pub fn with_instance(mut self, instance: Element) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Set the submission action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the submission method
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set the base URI
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Record a schema location on the model
    pub fn with_schema_uri(mut self, uri: impl Into<String>) -> Self {
        self.schema_uri = Some(uri.into());
        self
    }

    fn base(&self) -> &str {
        self.base.as_deref().unwrap_or("")
    }

    /// Action written on the submission (empty when unset)
    pub fn submission_action(&self) -> String {
        match &self.action {
            Some(action) => format!("{}{}", self.base(), action),
            None => String::new(),
        }
    }

    /// Method written on the submission
    pub fn submission_method(&self) -> &str {
        match self.method.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => SUBMIT_METHOD_POST,
        }
    }

    /// Schema reference written on the model
    pub fn schema_reference(&self) -> Option<String> {
        self.schema_uri
            .as_ref()
            .map(|uri| format!("{}{}", self.base(), uri))
    }
}

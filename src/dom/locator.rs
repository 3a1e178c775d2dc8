use crate::errors::{CheckError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// How an element is queried inside its search root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "lowercase")]
pub enum Locator {
    Id(String),
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Locator::Id(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Locator::XPath(value.into())
    }

    /// CSS form of id and CSS locators; XPath has none.
    pub fn as_css(&self) -> Option<String> {
        match self {
            Locator::Id(id) => Some(format!("[id=\"{}\"]", id.replace('"', "\\\""))),
            Locator::Css(css) => Some(css.clone()),
            Locator::XPath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id={}", v),
            Locator::Css(v) => write!(f, "css={}", v),
            Locator::XPath(v) => write!(f, "xpath={}", v),
        }
    }
}

/// Browsing context an element lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Document,
    /// Document of the embedded frame registered under this element name.
    Frame(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Document => write!(f, "the top-level document"),
            Scope::Frame(name) => write!(f, "frame '{}'", name),
        }
    }
}

/// Named, lazily resolved reference to one DOM node.
///
/// Holds only the query; the node itself is looked up again on every access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub name: String,
    pub locator: Locator,
    pub scope: Scope,
}

impl ElementRef {
    pub fn new(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            locator,
            scope: Scope::Document,
        }
    }

    pub fn in_frame(mut self, frame: impl Into<String>) -> Self {
        self.scope = Scope::Frame(frame.into());
        self
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.locator)
    }
}

/// Explicit semantic-name to element-reference mapping for one page.
#[derive(Debug, Clone, Default)]
pub struct LocatorTable {
    refs: HashMap<String, ElementRef>,
}

impl LocatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: ElementRef) {
        self.refs.insert(element.name.clone(), element);
    }

    pub fn with(mut self, element: ElementRef) -> Self {
        self.insert(element);
        self
    }

    pub fn get(&self, name: &str) -> Result<&ElementRef> {
        self.refs
            .get(name)
            .ok_or_else(|| CheckError::UnknownElement(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.refs.contains_key(name)
    }

    /// Replace the query of already declared elements; the scope is kept.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, Locator>) -> Result<()> {
        if let Some(unknown) = overrides.keys().find(|name| !self.refs.contains_key(*name)) {
            return Err(CheckError::ConfigurationError(format!(
                "locator override for undeclared element '{}'",
                unknown
            )));
        }

        for (name, locator) in overrides {
            if let Some(element) = self.refs.get_mut(name) {
                tracing::debug!(element = %name, locator = %locator, "locator overridden");
                element.locator = locator.clone();
            }
        }
        Ok(())
    }
}

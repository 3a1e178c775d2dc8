use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser not launched")]
    BrowserNotLaunched,

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// A bounded wait ran out before the element reached the wanted state.
    #[error("Element '{element}' not {condition} within {timeout_ms}ms")]
    ElementNotReady {
        element: String,
        condition: String,
        timeout_ms: u64,
    },

    #[error("Element handle is stale: {0}")]
    StaleElement(String),

    #[error("Element '{element}' belongs to {expected}, but the active context is {active}")]
    ContextMismatch {
        element: String,
        expected: String,
        active: String,
    },

    #[error("Invalid locator {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("Unknown element reference: {0}")]
    UnknownElement(String),

    #[error("Unknown payment tab label: {0}")]
    UnknownTab(String),

    #[error("Element '{element}' has no '{attribute}' attribute")]
    AttributeMissing { element: String, attribute: String },

    #[error("{context}: expected {expected:?}, got {actual:?}")]
    AssertionMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Chrome error: {0}")]
    ChromeError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CheckError>;

// headless_chrome reports everything as anyhow::Error
impl From<anyhow::Error> for CheckError {
    fn from(err: anyhow::Error) -> Self {
        CheckError::ChromeError(err.to_string())
    }
}

impl CheckError {
    /// True for a wait that expired, the only failure an optional element may swallow.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CheckError::ElementNotReady { .. })
    }

    /// Failures a page in transition produces; a later attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CheckError::StaleElement(_) | CheckError::JavaScriptFailed(_)
        )
    }
}

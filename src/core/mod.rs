pub mod browser;
pub mod config;

pub use browser::{BrowserDriver, ElementState, SearchRoot};
pub use config::{SuiteConfig, WaitConfig};

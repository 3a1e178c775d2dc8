pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod pages;
pub mod scenario;
pub mod testing;
pub mod types;

#[cfg(feature = "chrome")]
pub use browser::ChromeDriver;
pub use browser::{PageSession, WaitCondition};
pub use crate::core::{BrowserDriver, SuiteConfig, WaitConfig};
pub use dom::{ElementRef, Locator, LocatorTable, Scope};
pub use errors::{CheckError, Result};
pub use pages::{BrandMark, Field, PageLink, PageModel, PaySectionPage, PaymentTab};
pub use scenario::{pay_section_suite, Scenario, ScenarioReport, SuiteReport, SuiteRunner};
pub use types::*;

//! Page models: the per-page configuration of locators and operations.

#[cfg(test)]
pub(crate) mod fixture;
pub mod pay_section;

use crate::errors::Result;
use async_trait::async_trait;

pub use pay_section::{BrandMark, Field, PageLink, PaySectionPage, PaymentTab};

/// Lifecycle hooks a suite runner drives around each scenario.
#[async_trait]
pub trait PageModel: Send {
    /// Bring the page back to its freshly-loaded state.
    async fn reset(&mut self) -> Result<()>;

    /// Release the browser session; called once after the last scenario.
    async fn teardown(&mut self) -> Result<()>;
}

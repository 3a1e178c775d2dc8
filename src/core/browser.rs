use crate::dom::Locator;
use crate::errors::Result;
use crate::types::BrowserConfig;
use async_trait::async_trait;

/// Where a query starts: the top-level document or a frame document handle.
#[derive(Debug)]
pub enum SearchRoot<'a, E> {
    Document,
    Within(&'a E),
}

/// Snapshot of the properties waits poll on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementState {
    pub displayed: bool,
    pub enabled: bool,
}

/// Browser automation capability the page model is built on.
///
/// Element handles are transient: they are valid for the page load that
/// produced them and drivers report `StaleElement` for older ones.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    type Element: Clone + Send + Sync + std::fmt::Debug;

    /// Launch a new browser instance
    async fn launch(&mut self, config: &BrowserConfig) -> Result<()>;

    /// Navigate the single tab and wait for the load to finish
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// One query attempt; `Ok(None)` when nothing matches yet.
    async fn find_element(
        &self,
        root: SearchRoot<'_, Self::Element>,
        locator: &Locator,
    ) -> Result<Option<Self::Element>>;

    async fn element_state(&self, element: &Self::Element) -> Result<ElementState>;

    /// Document of an embedded frame element, once the frame has loaded.
    async fn frame_document(&self, frame: &Self::Element) -> Result<Option<Self::Element>>;

    /// Native pointer click at the element's center
    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// Click dispatched from script, immune to overlapping elements
    async fn dispatch_click(&self, element: &Self::Element) -> Result<()>;

    /// Append text at the end of the field's current content
    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<()>;

    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// Rendered text of the element
    async fn text(&self, element: &Self::Element) -> Result<String>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()>;

    /// Check if browser is still running
    fn is_running(&self) -> bool;

    /// Close the browser
    async fn close(&mut self) -> Result<()>;
}

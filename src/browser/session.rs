use crate::browser::wait::{poll_until, WaitCondition};
use crate::core::{BrowserDriver, SearchRoot, WaitConfig};
use crate::dom::{normalize_text, ElementRef, Scope};
use crate::errors::{CheckError, Result};
use crate::types::BrowserConfig;
use std::time::Duration;
use tracing::{debug, info};

/// Browsing context element queries currently resolve against.
///
/// A frame context keeps the frame's reference, not its document: the host
/// element and its document are resolved again on every query, so a frame
/// that swaps its document is followed.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionContext {
    TopLevel,
    Frame(ElementRef),
}

impl InteractionContext {
    pub fn scope(&self) -> Scope {
        match self {
            InteractionContext::TopLevel => Scope::Document,
            InteractionContext::Frame(frame) => Scope::Frame(frame.name.clone()),
        }
    }

    pub fn is_top_level(&self) -> bool {
        matches!(self, InteractionContext::TopLevel)
    }
}

/// Explicit handle over one browser session and its wait policy.
///
/// Every action resolves its element afresh, waits for the precondition and
/// performs a single DOM operation.
pub struct PageSession<D: BrowserDriver> {
    driver: D,
    waits: WaitConfig,
    context: InteractionContext,
}

impl<D: BrowserDriver> PageSession<D> {
    pub async fn launch(
        mut driver: D,
        browser: &BrowserConfig,
        waits: WaitConfig,
    ) -> Result<Self> {
        waits.validate()?;
        driver.launch(browser).await?;
        info!(headless = browser.headless, "browser session started");
        Ok(Self::new(driver, waits))
    }

    /// Wrap a driver that is already running.
    pub fn new(driver: D, waits: WaitConfig) -> Self {
        Self {
            driver,
            waits,
            context: InteractionContext::TopLevel,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn waits(&self) -> &WaitConfig {
        &self.waits
    }

    pub fn context(&self) -> &InteractionContext {
        &self.context
    }

    /// Load `url`; any frame context is left behind with the old page.
    pub async fn navigate(&mut self, url: &str) -> Result<()> {
        self.context = InteractionContext::TopLevel;
        info!(url, "navigating");
        self.driver.navigate(url).await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.driver.current_url().await
    }

    fn check_scope(&self, element: &ElementRef) -> Result<()> {
        let active = self.context.scope();
        if element.scope != active {
            return Err(CheckError::ContextMismatch {
                element: element.name.clone(),
                expected: element.scope.to_string(),
                active: active.to_string(),
            });
        }
        Ok(())
    }

    /// Single resolution attempt in the active context.
    pub async fn find(&self, element: &ElementRef) -> Result<Option<D::Element>> {
        self.check_scope(element)?;
        match &self.context {
            InteractionContext::TopLevel => {
                self.driver
                    .find_element(SearchRoot::Document, &element.locator)
                    .await
            }
            InteractionContext::Frame(frame) => {
                let Some(document) = self.frame_document(frame).await? else {
                    return Ok(None);
                };
                match self
                    .driver
                    .find_element(SearchRoot::Within(&document), &element.locator)
                    .await
                {
                    // document replaced between resolution and query
                    Err(CheckError::StaleElement(_)) => Ok(None),
                    other => other,
                }
            }
        }
    }

    /// Loaded document of `frame`, looked up from the top-level document.
    async fn frame_document(&self, frame: &ElementRef) -> Result<Option<D::Element>> {
        let Some(host) = self
            .driver
            .find_element(SearchRoot::Document, &frame.locator)
            .await?
        else {
            return Ok(None);
        };
        match self.driver.frame_document(&host).await {
            Err(CheckError::StaleElement(_)) => Ok(None),
            other => other,
        }
    }

    async fn probe(
        &self,
        element: &ElementRef,
        condition: WaitCondition,
    ) -> Result<Option<D::Element>> {
        let Some(handle) = self.find(element).await? else {
            return Ok(None);
        };
        if condition == WaitCondition::Present {
            return Ok(Some(handle));
        }
        match self.driver.element_state(&handle).await {
            Ok(state) if condition.satisfied_by(state) => Ok(Some(handle)),
            Ok(_) => Ok(None),
            // re-rendered between query and state read; query again
            Err(CheckError::StaleElement(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Wait up to the page timeout for `condition` on `element`.
    pub async fn wait_for(
        &self,
        element: &ElementRef,
        condition: WaitCondition,
    ) -> Result<D::Element> {
        self.wait_for_within(element, condition, self.waits.page_timeout())
            .await
    }

    pub async fn wait_for_within(
        &self,
        element: &ElementRef,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<D::Element> {
        // scope errors are not worth polling for
        self.check_scope(element)?;

        let found = poll_until(timeout, self.waits.poll_interval(), || {
            self.probe(element, condition)
        })
        .await?;

        match found {
            Some(handle) => {
                debug!(element = %element, %condition, "element ready");
                Ok(handle)
            }
            None => Err(CheckError::ElementNotReady {
                element: element.name.clone(),
                condition: condition.describe().to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Wait until the current URL equals `expected` exactly.
    ///
    /// Reads that fail mid-navigation count as "not there yet".
    pub async fn wait_for_url(&self, expected: &str) -> Result<String> {
        let timeout = self.waits.navigation_timeout();
        let found = poll_until(timeout, self.waits.poll_interval(), || async move {
            match self.driver.current_url().await {
                Ok(url) => Ok((url == expected).then_some(url)),
                Err(e) if e.is_transient() => {
                    debug!(error = %e, "URL not readable yet");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await?;

        match found {
            Some(url) => Ok(url),
            None => {
                let actual = match self.driver.current_url().await {
                    Ok(url) => url,
                    Err(e) => format!("<unreadable: {}>", e),
                };
                Err(CheckError::NavigationFailed(format!(
                    "expected URL {} within {}ms, still at {}",
                    expected,
                    timeout.as_millis(),
                    actual
                )))
            }
        }
    }

    /// Switch into `frame` once its document has loaded.
    pub async fn enter_frame(&mut self, frame: &ElementRef) -> Result<()> {
        self.check_scope(frame)?;
        let timeout = self.waits.page_timeout();
        let this = &*self;

        let loaded = poll_until(timeout, self.waits.poll_interval(), || async move {
            Ok(this.frame_document(frame).await?.map(|_| ()))
        })
        .await?;
        if loaded.is_none() {
            return Err(CheckError::ElementNotReady {
                element: frame.name.clone(),
                condition: "available as a frame".to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }

        info!(frame = %frame.name, "entered frame context");
        self.context = InteractionContext::Frame(frame.clone());
        Ok(())
    }

    /// Back to the top-level document, whatever the current context.
    pub fn exit_frame(&mut self) {
        if let InteractionContext::Frame(frame) = &self.context {
            info!(frame = %frame.name, "left frame context");
        }
        self.context = InteractionContext::TopLevel;
    }

    pub async fn click(&self, element: &ElementRef) -> Result<()> {
        let handle = self.wait_for(element, WaitCondition::Clickable).await?;
        self.driver.click(&handle).await
    }

    /// Script-dispatched click on an optional element.
    ///
    /// Returns `false` when the element did not become visible within the
    /// overlay timeout; that absence is not an error.
    pub async fn dispatch_click_if_present(&self, element: &ElementRef) -> Result<bool> {
        match self
            .wait_for_within(element, WaitCondition::Visible, self.waits.overlay_timeout())
            .await
        {
            Ok(handle) => {
                self.driver.dispatch_click(&handle).await?;
                Ok(true)
            }
            Err(e) if e.is_timeout() => {
                debug!(element = %element, "optional element absent");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn type_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        let handle = self.wait_for(element, WaitCondition::Visible).await?;
        debug!(element = %element.name, chars = text.chars().count(), "typing");
        self.driver.type_text(&handle, text).await
    }

    /// Trimmed attribute value of a visible element.
    pub async fn read_attribute(&self, element: &ElementRef, name: &str) -> Result<String> {
        let handle = self.wait_for(element, WaitCondition::Visible).await?;
        self.driver
            .attribute(&handle, name)
            .await?
            .map(|value| value.trim().to_string())
            .ok_or_else(|| CheckError::AttributeMissing {
                element: element.name.clone(),
                attribute: name.to_string(),
            })
    }

    /// Normalized rendered text of a visible element.
    pub async fn read_text(&self, element: &ElementRef) -> Result<String> {
        let handle = self.wait_for(element, WaitCondition::Visible).await?;
        let raw = self.driver.text(&handle).await?;
        Ok(normalize_text(&raw))
    }

    pub async fn scroll_into_view(&self, element: &ElementRef) -> Result<()> {
        let handle = self.wait_for(element, WaitCondition::Present).await?;
        self.driver.scroll_into_view(&handle).await
    }

    /// `Err` only when the element never appears; not displayed is `Ok(false)`.
    pub async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        self.wait_for(element, WaitCondition::Present).await?;
        match self.wait_for(element, WaitCondition::Visible).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn close(&mut self) -> Result<()> {
        self.context = InteractionContext::TopLevel;
        if self.driver.is_running() {
            self.driver.close().await?;
            info!("browser session closed");
        }
        Ok(())
    }
}

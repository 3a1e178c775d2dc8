use crate::core::{BrowserDriver, ElementState, SearchRoot};
use crate::dom::Locator;
use crate::errors::{CheckError, Result};
use crate::types::BrowserConfig;
use async_trait::async_trait;
use headless_chrome::protocol::cdp::DOM;
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde_json::{json, Value};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

const STATE_JS: &str = r#"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    const displayed = style.display !== 'none'
        && style.visibility !== 'hidden'
        && parseFloat(style.opacity || '1') > 0
        && (rect.width > 0 || rect.height > 0);
    return JSON.stringify({ displayed: displayed, enabled: !this.disabled });
}"#;

const XPATH_JS: &str = r#"function(xpath) {
    const doc = this.nodeType === 9 ? this : this.ownerDocument;
    return doc.evaluate(xpath, this, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
}"#;

const DOCUMENT_LOADED_JS: &str = r#"function() {
    return this.readyState === 'complete' && this.location.href !== 'about:blank';
}"#;

const FOCUS_END_JS: &str = r#"function() {
    this.focus();
    if (typeof this.setSelectionRange === 'function') {
        const n = (this.value || '').length;
        this.setSelectionRange(n, n);
    }
}"#;

/// Node handle that survives DOM agent node-id churn within one page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeNode {
    backend_node_id: DOM::BackendNodeId,
}

/// Chrome browser implementation
pub struct ChromeDriver {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    navigation_timeout: Duration,
}

impl ChromeDriver {
    pub fn new() -> Self {
        Self {
            browser: None,
            tab: None,
            navigation_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    fn tab(&self) -> Result<&Arc<Tab>> {
        self.tab.as_ref().ok_or(CheckError::BrowserNotLaunched)
    }

    fn node_id(&self, node: &ChromeNode) -> Result<DOM::NodeId> {
        let pushed = self
            .tab()?
            .call_method(DOM::PushNodesByBackendIdsToFrontend {
                backend_node_ids: vec![node.backend_node_id],
            })
            .map_err(|e| CheckError::StaleElement(e.to_string()))?;

        match pushed.node_ids.first() {
            Some(&id) if id != 0 => Ok(id),
            _ => Err(CheckError::StaleElement(format!(
                "backend node {} is gone",
                node.backend_node_id
            ))),
        }
    }

    fn element(&self, node: &ChromeNode) -> Result<Element<'_>> {
        let node_id = self.node_id(node)?;
        Element::new(self.tab()?, node_id)
            .map_err(|e| CheckError::StaleElement(e.to_string()))
    }

    fn call_on(
        &self,
        node: &ChromeNode,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Option<Value>> {
        let element = self.element(node)?;
        let result = element
            .call_js_fn(function, args, false)
            .map_err(|e| CheckError::JavaScriptFailed(e.to_string()))?;
        Ok(result.value)
    }

    fn root_node_id(&self, root: &SearchRoot<'_, ChromeNode>) -> Result<DOM::NodeId> {
        match root {
            SearchRoot::Document => Ok(self.tab()?.get_document()?.node_id),
            SearchRoot::Within(document) => self.node_id(document),
        }
    }

    fn find_by_css(&self, root: DOM::NodeId, selector: &str) -> Result<Option<ChromeNode>> {
        let found = self
            .tab()?
            .run_query_selector_on_node(root, selector)
            .map(|element| element.backend_node_id);
        css_query_outcome(selector, found)
    }

    fn find_by_xpath(&self, root: DOM::NodeId, xpath: &str) -> Result<Option<ChromeNode>> {
        let tab = self.tab()?;
        let root = Element::new(tab, root)?;
        let found = root
            .call_js_fn(XPATH_JS, vec![json!(xpath)], false)
            .map_err(|e| CheckError::JavaScriptFailed(e.to_string()))?;

        let Some(object_id) = found.object_id else {
            return Ok(None);
        };
        let requested = tab.call_method(DOM::RequestNode { object_id })?;
        let described = tab.call_method(DOM::DescribeNode {
            node_id: Some(requested.node_id),
            backend_node_id: None,
            object_id: None,
            depth: Some(0),
            pierce: Some(false),
        })?;
        Ok(Some(ChromeNode {
            backend_node_id: described.node.backend_node_id,
        }))
    }
}

impl Default for ChromeDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    type Element = ChromeNode;

    async fn launch(&mut self, config: &BrowserConfig) -> Result<()> {
        let args = config.launch_args();
        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .args(args.iter().map(OsStr::new).collect())
            .build()
            .map_err(|e| CheckError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| CheckError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| CheckError::LaunchFailed(e.to_string()))?;
        tab.set_default_timeout(self.navigation_timeout);

        self.browser = Some(browser);
        self.tab = Some(tab);
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .map_err(|e| CheckError::NavigationFailed(e.to_string()))?;

        tab.wait_until_navigated()
            .map_err(|e| CheckError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let tab = self.tab()?;
        match tab.evaluate("window.location.href", false) {
            Ok(result) => Ok(result
                .value
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| tab.get_url())),
            Err(e) => {
                // no execution context while a navigation is committing
                trace!(error = %e, "reading URL from the tab target");
                Ok(tab.get_url())
            }
        }
    }

    async fn find_element(
        &self,
        root: SearchRoot<'_, Self::Element>,
        locator: &Locator,
    ) -> Result<Option<Self::Element>> {
        let root_id = match self.root_node_id(&root) {
            Ok(id) => id,
            // frame document replaced by a navigation inside the frame
            Err(CheckError::StaleElement(_)) if matches!(root, SearchRoot::Within(_)) => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        match locator {
            Locator::XPath(xpath) => self.find_by_xpath(root_id, xpath),
            other => match other.as_css() {
                Some(selector) => self.find_by_css(root_id, &selector),
                None => Ok(None),
            },
        }
    }

    async fn element_state(&self, element: &Self::Element) -> Result<ElementState> {
        // objects do not come back by value, so the probe returns JSON text
        let raw = self
            .call_on(element, STATE_JS, vec![])?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let value: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
        Ok(ElementState {
            displayed: value.get("displayed").and_then(Value::as_bool).unwrap_or(false),
            enabled: value.get("enabled").and_then(Value::as_bool).unwrap_or(false),
        })
    }

    async fn frame_document(&self, frame: &Self::Element) -> Result<Option<Self::Element>> {
        let node_id = self.node_id(frame)?;
        let described = self.tab()?.call_method(DOM::DescribeNode {
            node_id: Some(node_id),
            backend_node_id: None,
            object_id: None,
            depth: Some(1),
            pierce: Some(true),
        })?;

        let Some(document) = described.node.content_document else {
            return Ok(None);
        };
        let document = ChromeNode {
            backend_node_id: document.backend_node_id,
        };

        // a fresh iframe starts on about:blank before its real document loads
        let loaded = self
            .call_on(&document, DOCUMENT_LOADED_JS, vec![])?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(loaded.then_some(document))
    }

    async fn click(&self, element: &Self::Element) -> Result<()> {
        self.element(element)?
            .click()
            .map_err(|e| CheckError::JavaScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn dispatch_click(&self, element: &Self::Element) -> Result<()> {
        self.call_on(element, "function() { this.click(); }", vec![])?;
        Ok(())
    }

    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<()> {
        let element = self.element(element)?;
        // caret to the end so the text is appended, not inserted at the click point
        element
            .call_js_fn(FOCUS_END_JS, vec![], false)
            .map_err(|e| CheckError::JavaScriptFailed(e.to_string()))?;
        element
            .parent
            .type_str(text)
            .map_err(|e| CheckError::JavaScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>> {
        let value = self.call_on(
            element,
            "function(name) { return this.getAttribute(name); }",
            vec![json!(name)],
        )?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn text(&self, element: &Self::Element) -> Result<String> {
        let value = self.call_on(
            element,
            "function() { return this.innerText || this.textContent || ''; }",
            vec![],
        )?;
        Ok(value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()> {
        self.call_on(element, "function() { this.scrollIntoView(true); }", vec![])?;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close(true) {
                trace!(error = %e, "tab already gone");
            }
        }
        // dropping the Browser kills the process
        self.browser = None;
        Ok(())
    }
}

/// Chrome's answer to a selector it cannot parse.
const REJECTED_SELECTOR: &str = "DOM Error while querying";

/// A selector Chrome rejects is an error; anything else that produced no
/// node leaves the query empty so the wait can try again.
fn css_query_outcome(
    selector: &str,
    found: anyhow::Result<DOM::BackendNodeId>,
) -> Result<Option<ChromeNode>> {
    match found {
        Ok(backend_node_id) => Ok(Some(ChromeNode { backend_node_id })),
        Err(e) if e.downcast_ref::<NoElementFound>().is_none()
            && e.to_string().contains(REJECTED_SELECTOR) =>
        {
            Err(CheckError::InvalidLocator {
                locator: format!("css={}", selector),
                reason: e.to_string(),
            })
        }
        Err(e) => {
            trace!(selector, error = %e, "css query found nothing");
            Ok(None)
        }
    }
}

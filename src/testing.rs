//! Scripted in-memory browser for exercising page models without Chrome.
//!
//! A [`FakePage`] is a flat list of nodes keyed by their [`Locator`]; a node
//! may host a frame with its own page. Navigating loads a fresh copy of the
//! registered page and bumps a generation counter, so handles from earlier
//! loads come back as `StaleElement`. Replacing a frame's document retires
//! the old one the same way.

use crate::core::{BrowserDriver, ElementState, SearchRoot};
use crate::dom::Locator;
use crate::errors::{CheckError, Result};
use crate::types::BrowserConfig;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// What happens to the page when a node is clicked.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickEffect {
    /// Load another registered page
    Navigate(String),
    /// Attach and display every node matching the locator
    Reveal(Locator),
    /// Hide every node matching the locator
    Conceal(Locator),
    /// Detach every node matching the locator
    Remove(Locator),
}

#[derive(Debug, Clone)]
pub struct FakeNode {
    locator: Locator,
    text: String,
    attributes: HashMap<String, String>,
    attached: bool,
    displayed: bool,
    enabled: bool,
    hidden_checks: u32,
    frame_loading_checks: u32,
    on_click: Vec<ClickEffect>,
    frame: Option<FakePage>,
}

impl FakeNode {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            text: String::new(),
            attributes: HashMap::new(),
            attached: true,
            displayed: true,
            enabled: true,
            hidden_checks: 0,
            frame_loading_checks: 0,
            on_click: vec![],
            frame: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn placeholder(self, value: impl Into<String>) -> Self {
        self.with_attribute("placeholder", value)
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Not part of the DOM until a click reveals it.
    pub fn detached(mut self) -> Self {
        self.attached = false;
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Report "not displayed" for the first `checks` state reads, as if still rendering.
    pub fn hidden_for_checks(mut self, checks: u32) -> Self {
        self.hidden_checks = checks;
        self
    }

    /// Report the hosted frame's document as still loading for the first `checks` lookups.
    pub fn frame_loading_for_checks(mut self, checks: u32) -> Self {
        self.frame_loading_checks = checks;
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click.push(effect);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    nodes: Vec<FakeNode>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, node: FakeNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_frame(mut self, mut host: FakeNode, content: FakePage) -> Self {
        host.frame = Some(content);
        self.nodes.push(host);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FakeTarget {
    Node { doc: usize, index: usize },
    Document(usize),
}

/// Handle into one load of a fake page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeElement {
    generation: u64,
    target: FakeTarget,
}

#[derive(Debug)]
struct LiveNode {
    node: FakeNode,
    frame_doc: Option<usize>,
    frame_reads: u32,
    state_reads: u32,
    clicks: u32,
    scrolls: u32,
    value: String,
}

#[derive(Debug, Default)]
struct FakeBrowser {
    pages: HashMap<String, FakePage>,
    url: String,
    generation: u64,
    docs: Vec<Vec<LiveNode>>,
    retired: HashSet<usize>,
    navigations: u32,
    failing_url_reads: u32,
}

impl FakeBrowser {
    fn load(&mut self, url: &str) -> Result<()> {
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| CheckError::NavigationFailed(format!("no fake page for {}", url)))?;
        self.docs.clear();
        self.retired.clear();
        Self::load_doc(&mut self.docs, page);
        self.url = url.to_string();
        self.generation += 1;
        self.navigations += 1;
        Ok(())
    }

    fn load_doc(docs: &mut Vec<Vec<LiveNode>>, page: FakePage) -> usize {
        let doc = docs.len();
        docs.push(Vec::new());
        for mut node in page.nodes {
            let frame_doc = node.frame.take().map(|content| Self::load_doc(docs, content));
            docs[doc].push(LiveNode {
                node,
                frame_doc,
                frame_reads: 0,
                state_reads: 0,
                clicks: 0,
                scrolls: 0,
                value: String::new(),
            });
        }
        doc
    }

    fn check_generation(&self, element: &FakeElement) -> Result<()> {
        if element.generation != self.generation {
            return Err(CheckError::StaleElement(format!(
                "handle from load {} used after load {}",
                element.generation, self.generation
            )));
        }
        Ok(())
    }

    fn check_document(&self, doc: usize) -> Result<()> {
        if self.retired.contains(&doc) {
            return Err(CheckError::StaleElement(format!(
                "frame document {} was replaced",
                doc
            )));
        }
        Ok(())
    }

    fn live_mut(&mut self, element: &FakeElement) -> Result<&mut LiveNode> {
        self.check_generation(element)?;
        let FakeTarget::Node { doc, index } = element.target else {
            return Err(CheckError::JavaScriptFailed(
                "operation needs an element, got a document".to_string(),
            ));
        };
        self.check_document(doc)?;
        let live = &mut self.docs[doc][index];
        if !live.node.attached {
            return Err(CheckError::StaleElement(format!(
                "{} was removed from the document",
                live.node.locator
            )));
        }
        Ok(live)
    }

    fn apply(&mut self, effects: Vec<ClickEffect>) -> Result<()> {
        for effect in effects {
            match effect {
                ClickEffect::Navigate(url) => self.load(&url)?,
                ClickEffect::Reveal(locator) => self.update_all(&locator, |node| {
                    node.attached = true;
                    node.displayed = true;
                }),
                ClickEffect::Conceal(locator) => {
                    self.update_all(&locator, |node| node.displayed = false)
                }
                ClickEffect::Remove(locator) => {
                    self.update_all(&locator, |node| node.attached = false)
                }
            }
        }
        Ok(())
    }

    fn update_all(&mut self, locator: &Locator, mut update: impl FnMut(&mut FakeNode)) {
        self.docs
            .iter_mut()
            .flatten()
            .filter(|live| &live.node.locator == locator)
            .for_each(|live| update(&mut live.node));
    }

    fn first_match(&self, locator: &Locator) -> Option<&LiveNode> {
        self.docs
            .iter()
            .flatten()
            .find(|live| &live.node.locator == locator)
    }
}

/// [`BrowserDriver`] over scripted pages; clones share the same browser state.
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    inner: Arc<RwLock<FakeBrowser>>,
    running: bool,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the page served for `url`.
    pub fn with_page(self, url: impl Into<String>, page: FakePage) -> Self {
        // builders run before anything can hold the lock
        if let Ok(mut inner) = self.inner.try_write() {
            inner.pages.insert(url.into(), page);
        }
        self
    }

    pub async fn clicks(&self, locator: &Locator) -> u32 {
        let inner = self.inner.read().await;
        inner.first_match(locator).map_or(0, |live| live.clicks)
    }

    pub async fn scrolls(&self, locator: &Locator) -> u32 {
        let inner = self.inner.read().await;
        inner.first_match(locator).map_or(0, |live| live.scrolls)
    }

    pub async fn value(&self, locator: &Locator) -> Option<String> {
        let inner = self.inner.read().await;
        inner.first_match(locator).map(|live| live.value.clone())
    }

    pub async fn navigations(&self) -> u32 {
        self.inner.read().await.navigations
    }

    /// Load `content` into the frame hosted by `host`, retiring its old document.
    pub async fn replace_frame(&self, host: &Locator, content: FakePage) -> Result<()> {
        let mut inner = self.inner.write().await;
        let position = inner.docs.iter().enumerate().find_map(|(doc, nodes)| {
            nodes
                .iter()
                .position(|live| &live.node.locator == host && live.frame_doc.is_some())
                .map(|index| (doc, index))
        });
        let Some((doc, index)) = position else {
            return Err(CheckError::JavaScriptFailed(format!(
                "{} does not host a frame",
                host
            )));
        };

        let fresh = FakeBrowser::load_doc(&mut inner.docs, content);
        let old = inner.docs[doc][index].frame_doc.replace(fresh);
        if let Some(old) = old {
            inner.retired.insert(old);
        }
        Ok(())
    }

    /// Fail the next `reads` URL lookups, as during a page transition.
    pub async fn fail_url_reads(&self, reads: u32) {
        self.inner.write().await.failing_url_reads = reads;
    }

    fn ensure_running(&self) -> Result<()> {
        if self.running {
            Ok(())
        } else {
            Err(CheckError::BrowserNotLaunched)
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    type Element = FakeElement;

    async fn launch(&mut self, _config: &BrowserConfig) -> Result<()> {
        self.running = true;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_running()?;
        self.inner.write().await.load(url)
    }

    async fn current_url(&self) -> Result<String> {
        self.ensure_running()?;
        let mut inner = self.inner.write().await;
        if inner.failing_url_reads > 0 {
            inner.failing_url_reads -= 1;
            return Err(CheckError::JavaScriptFailed(
                "Execution context was destroyed".to_string(),
            ));
        }
        Ok(inner.url.clone())
    }

    async fn find_element(
        &self,
        root: SearchRoot<'_, Self::Element>,
        locator: &Locator,
    ) -> Result<Option<Self::Element>> {
        self.ensure_running()?;
        if let Locator::Css(selector) = locator {
            if selector.trim().is_empty() {
                return Err(CheckError::InvalidLocator {
                    locator: locator.to_string(),
                    reason: "empty selector".to_string(),
                });
            }
        }
        let inner = self.inner.read().await;
        if inner.docs.is_empty() {
            return Ok(None);
        }

        let doc = match root {
            SearchRoot::Document => 0,
            SearchRoot::Within(element) => {
                inner.check_generation(element)?;
                match element.target {
                    FakeTarget::Document(doc) => {
                        inner.check_document(doc)?;
                        doc
                    }
                    FakeTarget::Node { .. } => {
                        return Err(CheckError::JavaScriptFailed(
                            "search root must be a document".to_string(),
                        ))
                    }
                }
            }
        };

        Ok(inner.docs[doc]
            .iter()
            .position(|live| live.node.attached && &live.node.locator == locator)
            .map(|index| FakeElement {
                generation: inner.generation,
                target: FakeTarget::Node { doc, index },
            }))
    }

    async fn element_state(&self, element: &Self::Element) -> Result<ElementState> {
        let mut inner = self.inner.write().await;
        let live = inner.live_mut(element)?;
        live.state_reads += 1;
        Ok(ElementState {
            displayed: live.node.displayed && live.state_reads > live.node.hidden_checks,
            enabled: live.node.enabled,
        })
    }

    async fn frame_document(&self, frame: &Self::Element) -> Result<Option<Self::Element>> {
        let mut inner = self.inner.write().await;
        let generation = inner.generation;
        let live = inner.live_mut(frame)?;
        live.frame_reads += 1;
        if live.frame_reads <= live.node.frame_loading_checks {
            return Ok(None);
        }
        Ok(live.frame_doc.map(|doc| FakeElement {
            generation,
            target: FakeTarget::Document(doc),
        }))
    }

    async fn click(&self, element: &Self::Element) -> Result<()> {
        let mut inner = self.inner.write().await;
        let live = inner.live_mut(element)?;
        if !live.node.displayed || !live.node.enabled {
            return Err(CheckError::JavaScriptFailed(format!(
                "{} is not interactable",
                live.node.locator
            )));
        }
        live.clicks += 1;
        let effects = live.node.on_click.clone();
        inner.apply(effects)
    }

    async fn dispatch_click(&self, element: &Self::Element) -> Result<()> {
        let mut inner = self.inner.write().await;
        let live = inner.live_mut(element)?;
        live.clicks += 1;
        let effects = live.node.on_click.clone();
        inner.apply(effects)
    }

    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.live_mut(element)?.value.push_str(text);
        Ok(())
    }

    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>> {
        let mut inner = self.inner.write().await;
        Ok(inner.live_mut(element)?.node.attributes.get(name).cloned())
    }

    async fn text(&self, element: &Self::Element) -> Result<String> {
        let mut inner = self.inner.write().await;
        Ok(inner.live_mut(element)?.node.text.clone())
    }

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.live_mut(element)?.scrolls += 1;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    async fn close(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }
}

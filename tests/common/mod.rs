// Scripted in-memory browser used by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use domain_compare::core::profile::{PriceExtraction, SearchStep, SiteProfile, SubmitMode};
use domain_compare::domain::ports::{BrowserSession, LaunchOptions, PageSnapshot, SessionLauncher};
use domain_compare::{CompareError, Registrar, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a fake site shows before and after the search is submitted.
#[derive(Clone, Default)]
pub struct FakePage {
    pub elements: HashMap<String, String>,
    pub after_submit: HashMap<String, String>,
    /// Selector reported absent for the first N probes.
    pub appear_after_polls: HashMap<String, usize>,
    /// Probe numbers (1-based) that fail the way an evaluation does mid-navigation.
    pub failing_probes: HashMap<String, Vec<usize>>,
    pub navigate_error: bool,
    pub panic_on: Option<String>,
}

impl FakePage {
    pub fn with(mut self, selector: &str, text: &str) -> Self {
        self.elements.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn after_submit(mut self, selector: &str, text: &str) -> Self {
        self.after_submit.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn delayed(mut self, selector: &str, polls: usize) -> Self {
        self.appear_after_polls.insert(selector.to_string(), polls);
        self
    }

    pub fn failing_on_probe(mut self, selector: &str, probe: usize) -> Self {
        self.failing_probes
            .entry(selector.to_string())
            .or_default()
            .push(probe);
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.navigate_error = true;
        self
    }

    pub fn panicking_on(mut self, selector: &str) -> Self {
        self.panic_on = Some(selector.to_string());
        self
    }
}

#[derive(Default)]
pub struct SessionStats {
    pub launched: AtomicUsize,
    pub closed: AtomicUsize,
    pub cookie_leaks: AtomicUsize,
    pub typed: Mutex<Vec<String>>,
    pub clicked: Mutex<Vec<String>>,
    pub user_agents: Mutex<Vec<String>>,
    pub launch_options: Mutex<Vec<LaunchOptions>>,
}

impl SessionStats {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    /// Keyed by URL prefix.
    pages: Arc<HashMap<String, FakePage>>,
    pub stats: Arc<SessionStats>,
    fail_launch: bool,
}

impl ScriptedLauncher {
    pub fn new(pages: Vec<(&str, FakePage)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(prefix, page)| (prefix.to_string(), page))
                    .collect(),
            ),
            stats: Arc::new(SessionStats::default()),
            fail_launch: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl SessionLauncher for ScriptedLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>> {
        if self.fail_launch {
            return Err(CompareError::LaunchError {
                message: "no chrome in test environment".to_string(),
            });
        }
        self.stats.launched.fetch_add(1, Ordering::SeqCst);
        self.stats.launch_options.lock().unwrap().push(options.clone());

        Ok(Box::new(ScriptedSession {
            pages: self.pages.clone(),
            stats: self.stats.clone(),
            page: None,
            visible: HashMap::new(),
            probes: HashMap::new(),
            cookies: Vec::new(),
        }))
    }
}

pub struct ScriptedSession {
    pages: Arc<HashMap<String, FakePage>>,
    stats: Arc<SessionStats>,
    page: Option<FakePage>,
    visible: HashMap<String, String>,
    probes: HashMap<String, usize>,
    cookies: Vec<String>,
}

impl ScriptedSession {
    fn check_panic(&self, selector: &str) {
        if let Some(page) = &self.page {
            if page.panic_on.as_deref() == Some(selector) {
                panic!("scripted panic on {}", selector);
            }
        }
    }

    fn submitted(&mut self) {
        if let Some(page) = &self.page {
            self.visible.extend(page.after_submit.clone());
        }
    }

    fn require(&self, selector: &str) -> Result<()> {
        if self.visible.contains_key(selector) {
            Ok(())
        } else {
            Err(CompareError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn set_user_agent(&mut self, user_agent: &str) -> Result<()> {
        self.stats.user_agents.lock().unwrap().push(user_agent.to_string());
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let page = self
            .pages
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, page)| page.clone())
            .ok_or_else(|| CompareError::LaunchError {
                message: format!("net::ERR_NAME_NOT_RESOLVED {}", url),
            })?;

        if page.navigate_error {
            return Err(CompareError::LaunchError {
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }

        // A fresh session must start with an empty cookie jar.
        if !self.cookies.is_empty() {
            self.stats.cookie_leaks.fetch_add(1, Ordering::SeqCst);
        }
        self.cookies.push(format!("visited={}", url));

        self.visible = page.elements.clone();
        self.page = Some(page);
        Ok(())
    }

    async fn exists(&mut self, selector: &str) -> Result<bool> {
        self.check_panic(selector);

        let probes = self.probes.entry(selector.to_string()).or_insert(0);
        *probes += 1;
        let probe = *probes;

        let Some(page) = self.page.as_ref() else {
            return Ok(false);
        };
        if page
            .failing_probes
            .get(selector)
            .is_some_and(|failing| failing.contains(&probe))
        {
            return Err(CompareError::NavigationError {
                url: "about:blank".to_string(),
                message: "Execution context was destroyed".to_string(),
            });
        }
        let needed = page.appear_after_polls.get(selector).copied().unwrap_or(0);
        if probe <= needed {
            return Ok(false);
        }

        Ok(self.visible.contains_key(selector))
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.stats.clicked.lock().unwrap().push(selector.to_string());
        self.submitted();
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        self.require(selector)?;
        self.stats.typed.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn press_enter(&mut self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.submitted();
        Ok(())
    }

    async fn submit_form(&mut self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.submitted();
        Ok(())
    }

    async fn text_of(&mut self, selector: &str) -> Result<Option<String>> {
        self.check_panic(selector);
        Ok(self.visible.get(selector).map(|t| t.trim().to_string()))
    }

    async fn snapshot(&mut self) -> Result<PageSnapshot> {
        let body: Vec<String> = self.visible.keys().cloned().collect();
        Ok(PageSnapshot {
            html: format!("<html><body>{}</body></html>", body.join(",")),
            screenshot_png: vec![0x89, b'P', b'N', b'G'],
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub const SEARCH_INPUT: &str = "input.search";
pub const RESULTS: &str = "div.results";
pub const PRICE: &str = "div.results span.price";

/// A small profile with millisecond timeouts, shaped like the Namecheap flow.
pub fn fast_profile(registrar: Registrar, entry_url: &str) -> SiteProfile {
    SiteProfile {
        registrar,
        enabled: true,
        entry_url: entry_url.to_string(),
        navigation_timeout: Duration::from_millis(500),
        launch: LaunchOptions::default(),
        user_agent: None,
        consent: None,
        search: Some(SearchStep {
            input_selector: SEARCH_INPUT.to_string(),
            input_timeout: Duration::from_millis(200),
            submit: SubmitMode::EnterKey,
        }),
        results_selector: RESULTS.to_string(),
        results_timeout: Duration::from_millis(200),
        settle_delay: Duration::ZERO,
        price: PriceExtraction::Single {
            selector: PRICE.to_string(),
        },
        poll_interval: Duration::from_millis(10),
    }
}

/// A healthy site: search input up front, results and price after submit.
pub fn healthy_page(price: &str) -> FakePage {
    FakePage::default()
        .with(SEARCH_INPUT, "")
        .after_submit(RESULTS, "")
        .after_submit(PRICE, price)
}

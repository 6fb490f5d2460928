use crate::core::diagnostics::DiagnosticsRecorder;
use crate::core::profile::{PriceExtraction, SiteProfile, SubmitMode};
use crate::domain::model::{PriceQuery, PriceResult, Registrar};
use crate::domain::ports::{BrowserSession, PriceSource, SessionLauncher, Storage};
use crate::utils::error::{CompareError, Result};
use async_trait::async_trait;
use futures::FutureExt;
use regex::Regex;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// 依照 [`SiteProfile`] 走完整個抓價流程的通用爬蟲
pub struct SiteScraper<S: Storage> {
    profile: SiteProfile,
    launcher: Arc<dyn SessionLauncher>,
    diagnostics: Arc<DiagnosticsRecorder<S>>,
}

impl<S: Storage> SiteScraper<S> {
    pub fn new(
        profile: SiteProfile,
        launcher: Arc<dyn SessionLauncher>,
        diagnostics: Arc<DiagnosticsRecorder<S>>,
    ) -> Self {
        Self {
            profile,
            launcher,
            diagnostics,
        }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// 導航、同意 cookie、搜尋、等待結果、擷取價格
    async fn run_steps(&self, session: &mut dyn BrowserSession, query: &PriceQuery) -> Result<String> {
        let p = &self.profile;

        if let Some(user_agent) = &p.user_agent {
            session.set_user_agent(user_agent).await?;
        }

        let url = p.entry_url_for(query);
        tracing::debug!("{}: navigating to {}", p.registrar, url);
        navigate(session, &url, p.navigation_timeout).await?;

        if let Some(consent) = &p.consent {
            // 同意視窗是否出現只做偵測，找不到或點擊失敗都不算錯誤
            match session.exists(&consent.selector).await {
                Ok(true) => {
                    tracing::debug!("{}: cookie consent found, accepting", p.registrar);
                    match session.click(&consent.selector).await {
                        Ok(()) => tokio::time::sleep(consent.pause).await,
                        Err(e) => tracing::debug!("{}: consent click failed: {}", p.registrar, e),
                    }
                }
                Ok(false) => {}
                Err(e) => tracing::debug!("{}: consent probe failed: {}", p.registrar, e),
            }
        }

        if let Some(search) = &p.search {
            tracing::debug!("{}: waiting for search input", p.registrar);
            wait_for(session, &search.input_selector, search.input_timeout, p.poll_interval).await?;

            bounded(&search.input_selector, p.navigation_timeout, async {
                session.type_text(&search.input_selector, &query.fqdn()).await?;
                match &search.submit {
                    SubmitMode::EnterKey => session.press_enter(&search.input_selector).await,
                    SubmitMode::Click(selector) => session.click(selector).await,
                    SubmitMode::Form(selector) => session.submit_form(selector).await,
                }
            })
            .await?;
        }

        tracing::debug!("{}: waiting for results", p.registrar);
        wait_for(session, &p.results_selector, p.results_timeout, p.poll_interval).await?;

        if !p.settle_delay.is_zero() {
            tokio::time::sleep(p.settle_delay).await;
        }

        extract_price(session, &p.price).await
    }

    async fn capture_diagnostics(&self, session: &mut dyn BrowserSession) {
        if !self.diagnostics.is_enabled() {
            return;
        }

        let snapshot = match session.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("{}: could not capture page snapshot: {}", self.profile.registrar, e);
                return;
            }
        };

        match self
            .diagnostics
            .record_missing_price(self.profile.registrar, &snapshot)
            .await
        {
            Ok(files) => tracing::warn!(
                "📸 {}: price element missing, saved diagnostics {:?}",
                self.profile.registrar,
                files
            ),
            Err(e) => tracing::warn!("{}: could not save diagnostics: {}", self.profile.registrar, e),
        }
    }
}

#[async_trait]
impl<S: Storage + 'static> PriceSource for SiteScraper<S> {
    fn registrar(&self) -> Registrar {
        self.profile.registrar
    }

    async fn fetch_price(&self, query: &PriceQuery) -> PriceResult {
        let registrar = self.profile.registrar;
        let started = Instant::now();

        let mut session = match self.launcher.launch(&self.profile.launch).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("❌ {}: browser launch failed for {}: {}", registrar, query, e);
                return PriceResult::unavailable(registrar);
            }
        };

        let outcome = AssertUnwindSafe(self.run_steps(session.as_mut(), query))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(CompareError::ScraperPanic {
                    message: panic_message(panic.as_ref()),
                })
            });

        let markup_drift = matches!(&outcome, Err(e) if e.is_markup_drift());
        if markup_drift {
            self.capture_diagnostics(session.as_mut()).await;
        }

        // 不論成功或失敗都要釋放工作階段
        if let Err(e) = session.close().await {
            tracing::warn!("{}: closing browser session failed: {}", registrar, e);
        }

        match outcome {
            Ok(price) => {
                tracing::info!(
                    "💰 {} price for {}: {} ({:?})",
                    registrar,
                    query,
                    price,
                    started.elapsed()
                );
                PriceResult::quoted(registrar, price)
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ {} unavailable for {} after {:?}: {} (category: {:?})",
                    registrar,
                    query,
                    started.elapsed(),
                    e,
                    e.category()
                );
                PriceResult::unavailable(registrar)
            }
        }
    }
}

async fn navigate(session: &mut dyn BrowserSession, url: &str, timeout: Duration) -> Result<()> {
    match tokio::time::timeout(timeout, session.navigate(url)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(CompareError::NavigationError {
            url: url.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Err(CompareError::NavigationError {
            url: url.to_string(),
            message: format!("timed out after {:?}", timeout),
        }),
    }
}

async fn bounded<T>(selector: &str, timeout: Duration, step: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(timeout, step)
        .await
        .map_err(|_| CompareError::TimeoutError {
            selector: selector.to_string(),
            waited_ms: timeout.as_millis(),
        })?
}

/// 以固定間隔輪詢選擇器直到出現或逾時；只有逾時會結束等待
pub async fn wait_for(
    session: &mut dyn BrowserSession,
    selector: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    bounded(selector, timeout, async {
        loop {
            match session.exists(selector).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                // 送出表單後頁面切換時，評估可能因執行環境被銷毀而失敗
                Err(e) => tracing::debug!("Probe for {} failed, polling again: {}", selector, e),
            }
            tokio::time::sleep(poll_interval).await;
        }
    })
    .await
}

async fn extract_price(session: &mut dyn BrowserSession, extraction: &PriceExtraction) -> Result<String> {
    match extraction {
        PriceExtraction::Single { selector } => session
            .text_of(selector)
            .await?
            .map(|text| normalize_price_text(&text))
            .filter(|text| !text.is_empty())
            .ok_or_else(|| CompareError::PriceElementMissing {
                selector: selector.clone(),
            }),
        PriceExtraction::Composite {
            marker,
            major,
            minor,
            currency,
            separator,
        } => {
            if !session.exists(marker).await? {
                return Err(CompareError::PriceElementMissing {
                    selector: extraction.presence_selector().to_string(),
                });
            }
            let major_text = required_text(session, major).await?;
            let minor_text = required_text(session, minor).await?;
            Ok(format!("{}{}{}{}", currency, major_text, separator, minor_text))
        }
    }
}

async fn required_text(session: &mut dyn BrowserSession, selector: &str) -> Result<String> {
    session
        .text_of(selector)
        .await?
        .map(|text| normalize_price_text(&text))
        .ok_or_else(|| CompareError::ElementNotFound {
            selector: selector.to_string(),
        })
}

/// 修剪頭尾並把連續空白壓成單一空格
pub fn normalize_price_text(raw: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re.replace_all(raw.trim(), " ").into_owned()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

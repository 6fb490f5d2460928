use crate::domain::ports::{BrowserSession, LaunchOptions, PageSnapshot, SessionLauncher};
use crate::utils::error::{CompareError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// 送出關閉指令後等待瀏覽器行程結束的上限
const BROWSER_EXIT_TIMEOUT: Duration = Duration::from_secs(5);

/// 每次啟動都使用獨立行程與臨時設定檔目錄，關閉時一併刪除
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    executable: Option<PathBuf>,
    force_headful: bool,
}

impl ChromeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }

    /// 除錯用：不管站點設定，一律開啟可見視窗
    pub fn with_force_headful(mut self, force_headful: bool) -> Self {
        self.force_headful = force_headful;
        self
    }

    fn browser_config(&self, options: &LaunchOptions, profile_dir: &TempDir) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder().user_data_dir(profile_dir.path());

        if !options.headless || self.force_headful {
            builder = builder.with_head();
        }
        if let Some((width, height)) = options.window_size {
            builder = builder.window_size(width, height).viewport(Viewport {
                width,
                height,
                ..Viewport::default()
            });
        }
        if !options.args.is_empty() {
            builder = builder.args(options.args.iter().cloned());
        }
        if let Some(executable) = &self.executable {
            builder = builder.chrome_executable(executable);
        }

        builder
            .build()
            .map_err(|message| CompareError::LaunchError { message })
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>> {
        let profile_dir = tempfile::Builder::new()
            .prefix("domain-compare-")
            .tempdir()?;
        let config = self.browser_config(options, &profile_dir)?;

        let (mut browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| CompareError::LaunchError {
                    message: e.to_string(),
                })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = shutdown(&mut browser, BROWSER_EXIT_TIMEOUT).await {
                    tracing::warn!("Closing browser after failed page creation: {}", close_err);
                }
                handler_task.abort();
                return Err(CompareError::LaunchError {
                    message: e.to_string(),
                });
            }
        };

        tracing::debug!("Launched browser session (headless: {})", options.headless && !self.force_headful);

        Ok(Box::new(ChromeSession {
            browser,
            page,
            handler_task,
            profile_dir,
        }))
    }
}

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    profile_dir: TempDir,
}

impl ChromeSession {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        let value = self.page.evaluate(script).await?.into_value()?;
        Ok(value)
    }
}

fn js_string(selector: &str) -> Result<String> {
    Ok(serde_json::to_string(selector)?)
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn set_user_agent(&mut self, user_agent: &str) -> Result<()> {
        self.page.set_user_agent(user_agent).await?;
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn exists(&mut self, selector: &str) -> Result<bool> {
        let script = format!("document.querySelector({}) !== null", js_string(selector)?);
        self.eval(script).await
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let element = self.page.find_element(selector).await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn press_enter(&mut self, selector: &str) -> Result<()> {
        self.page.find_element(selector).await?.press_key("Enter").await?;
        Ok(())
    }

    async fn submit_form(&mut self, selector: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const form = document.querySelector({}); if (!form) return false; form.submit(); return true; }})()",
            js_string(selector)?
        );
        let submitted: bool = self.eval(script).await?;
        if submitted {
            Ok(())
        } else {
            Err(CompareError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }

    async fn text_of(&mut self, selector: &str) -> Result<Option<String>> {
        // CDP 對 null 結果不回傳 value，所以改回傳 [found, text]
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return el ? [true, el.textContent.trim()] : [false, '']; }})()",
            js_string(selector)?
        );
        let (found, text): (bool, String) = self.eval(script).await?;
        Ok(found.then_some(text))
    }

    async fn snapshot(&mut self) -> Result<PageSnapshot> {
        let html = self.page.content().await?;
        let screenshot_png = self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await?;
        Ok(PageSnapshot {
            html,
            screenshot_png,
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut session = *self;
        let closed = shutdown(&mut session.browser, BROWSER_EXIT_TIMEOUT).await;
        session.handler_task.abort();
        // 瀏覽器結束後才刪除設定檔目錄
        if let Err(e) = session.profile_dir.close() {
            tracing::debug!("Removing browser profile directory failed: {}", e);
        }
        closed
    }
}

/// 瀏覽器行程的關閉操作，讓關閉流程不需要真的 Chrome 也能測試
#[async_trait]
trait BrowserProcess: Send {
    async fn request_close(&mut self) -> Result<()>;
    async fn wait_exit(&mut self) -> Result<()>;
    async fn force_kill(&mut self) -> Result<()>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<()> {
        self.close().await?;
        Ok(())
    }

    async fn wait_exit(&mut self) -> Result<()> {
        self.wait().await?;
        Ok(())
    }

    async fn force_kill(&mut self) -> Result<()> {
        // 透過 websocket 連上的瀏覽器沒有子行程可終止
        match self.kill().await {
            Some(result) => Ok(result?),
            None => Ok(()),
        }
    }
}

async fn kill_process<B: BrowserProcess>(browser: &mut B) {
    if let Err(e) = browser.force_kill().await {
        tracing::warn!("Killing browser process failed: {}", e);
    }
}

/// 關閉指令送不出去 (handler 已結束) 或行程逾時未結束時強制終止，
/// 因此一定會在有限時間內返回
async fn shutdown<B: BrowserProcess>(browser: &mut B, exit_timeout: Duration) -> Result<()> {
    let requested = browser.request_close().await;
    if let Err(e) = &requested {
        tracing::warn!("Browser close request failed, killing process: {}", e);
        kill_process(browser).await;
    }

    match tokio::time::timeout(exit_timeout, browser.wait_exit()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("Waiting for browser process exit failed: {}", e),
        Err(_) => {
            tracing::warn!("Browser did not exit within {:?}, killing process", exit_timeout);
            kill_process(browser).await;
        }
    }

    requested
}

use crate::domain::model::{PriceQuery, PriceResult, Registrar};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 單一註冊商的報價能力；實作必須把內部失敗轉成 `Unavailable` 而非回傳錯誤
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn registrar(&self) -> Registrar;
    async fn fetch_price(&self, query: &PriceQuery) -> PriceResult;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub window_size: Option<(u32, u32)>,
    pub args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: None,
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub html: String,
    pub screenshot_png: Vec<u8>,
}

/// 一個獨立的瀏覽器工作階段；`close` 取得所有權，所以每個階段只能釋放一次
#[async_trait]
pub trait BrowserSession: Send {
    async fn set_user_agent(&mut self, user_agent: &str) -> Result<()>;
    async fn navigate(&mut self, url: &str) -> Result<()>;
    async fn exists(&mut self, selector: &str) -> Result<bool>;
    async fn click(&mut self, selector: &str) -> Result<()>;
    async fn type_text(&mut self, selector: &str, text: &str) -> Result<()>;
    async fn press_enter(&mut self, selector: &str) -> Result<()>;
    async fn submit_form(&mut self, selector: &str) -> Result<()>;
    /// 元素不存在時回傳 `None`，存在時回傳修剪過的文字
    async fn text_of(&mut self, selector: &str) -> Result<Option<String>>;
    async fn snapshot(&mut self) -> Result<PageSnapshot>;
    async fn close(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>>;
}

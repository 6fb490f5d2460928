use crate::domain::model::{PriceQuery, Registrar};
use crate::domain::ports::LaunchOptions;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_timeout, validate_url_template, Validate};
use std::time::Duration;

pub const MIN_WAIT: Duration = Duration::from_millis(10);
pub const MAX_WAIT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMode {
    /// 在輸入框按 Enter
    EnterKey,
    /// 點擊送出按鈕
    Click(String),
    /// 直接呼叫表單的 submit()
    Form(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStep {
    pub input_selector: String,
    pub input_timeout: Duration,
    pub submit: SubmitMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentStep {
    pub selector: String,
    pub pause: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceExtraction {
    Single {
        selector: String,
    },
    /// 整數與小數分開渲染的價格，組成 `{currency}{major}{separator}{minor}`
    Composite {
        marker: String,
        major: String,
        minor: String,
        currency: String,
        separator: String,
    },
}

impl PriceExtraction {
    /// 判斷價格是否存在時檢查的選擇器
    pub fn presence_selector(&self) -> &str {
        match self {
            PriceExtraction::Single { selector } => selector,
            PriceExtraction::Composite { marker, .. } => marker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub registrar: Registrar,
    pub enabled: bool,
    /// 可使用 `{domain}`、`{extension}`、`{fqdn}` 佔位符
    pub entry_url: String,
    pub navigation_timeout: Duration,
    pub launch: LaunchOptions,
    pub user_agent: Option<String>,
    pub consent: Option<ConsentStep>,
    pub search: Option<SearchStep>,
    pub results_selector: String,
    pub results_timeout: Duration,
    pub settle_delay: Duration,
    pub price: PriceExtraction,
    pub poll_interval: Duration,
}

impl SiteProfile {
    pub fn entry_url_for(&self, query: &PriceQuery) -> String {
        self.entry_url
            .replace("{fqdn}", &query.fqdn())
            .replace("{domain}", &query.domain)
            .replace("{extension}", &query.extension)
    }

    fn field(&self, name: &str) -> String {
        format!("sites.{}.{}", self.registrar.key(), name)
    }
}

impl Validate for SiteProfile {
    fn validate(&self) -> Result<()> {
        validate_url_template(&self.field("entry_url"), &self.entry_url)?;
        validate_timeout(&self.field("navigation_timeout"), self.navigation_timeout, MIN_WAIT, MAX_WAIT)?;
        validate_non_empty_string(&self.field("results_selector"), &self.results_selector)?;
        validate_timeout(&self.field("results_timeout"), self.results_timeout, MIN_WAIT, MAX_WAIT)?;
        // 輪詢間隔為 0 會讓等待迴圈空轉
        validate_timeout(&self.field("poll_interval"), self.poll_interval, MIN_WAIT, MAX_WAIT)?;

        if let Some(search) = &self.search {
            validate_non_empty_string(&self.field("search.input_selector"), &search.input_selector)?;
            validate_timeout(&self.field("search.input_timeout"), search.input_timeout, MIN_WAIT, MAX_WAIT)?;
        }

        match &self.price {
            PriceExtraction::Single { selector } => {
                validate_non_empty_string(&self.field("price.selector"), selector)?;
            }
            PriceExtraction::Composite { marker, major, minor, .. } => {
                validate_non_empty_string(&self.field("price.marker"), marker)?;
                validate_non_empty_string(&self.field("price.major"), major)?;
                validate_non_empty_string(&self.field("price.minor"), minor)?;
            }
        }

        Ok(())
    }
}

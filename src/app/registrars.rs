use crate::core::profile::{ConsentStep, PriceExtraction, SearchStep, SiteProfile, SubmitMode};
use crate::domain::model::Registrar;
use crate::domain::ports::LaunchOptions;
use std::time::Duration;

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/97.0.4692.71 Safari/537.36";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

fn stealth_args() -> Vec<String> {
    vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
    ]
}

pub fn namecheap() -> SiteProfile {
    SiteProfile {
        registrar: Registrar::Namecheap,
        enabled: true,
        entry_url: "https://www.namecheap.com/domains/domain-name-search/".to_string(),
        navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        launch: LaunchOptions::default(),
        user_agent: None,
        consent: None,
        search: Some(SearchStep {
            input_selector: ".gb-search__field".to_string(),
            input_timeout: Duration::from_secs(20),
            submit: SubmitMode::EnterKey,
        }),
        results_selector: r#"article[class^="domain-"] .price > strong"#.to_string(),
        results_timeout: Duration::from_secs(30),
        settle_delay: Duration::ZERO,
        price: PriceExtraction::Single {
            selector: r#"article[class^="domain-"] .price > strong"#.to_string(),
        },
        poll_interval: DEFAULT_POLL_INTERVAL,
    }
}

/// GoDaddy 已實作但預設不啟用，需在設定檔或 `--sources` 中開啟
pub fn godaddy() -> SiteProfile {
    SiteProfile {
        registrar: Registrar::GoDaddy,
        enabled: false,
        entry_url: "https://www.godaddy.com/domainsearch/find?domainToCheck={fqdn}".to_string(),
        navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        launch: LaunchOptions {
            headless: true,
            window_size: Some((1280, 800)),
            args: stealth_args(),
        },
        user_agent: Some(DESKTOP_USER_AGENT.to_string()),
        consent: Some(ConsentStep {
            selector: "button#onetrust-accept-btn-handler".to_string(),
            pause: Duration::from_secs(3),
        }),
        search: None,
        results_selector: r#"div[data-cy="availableCard"]"#.to_string(),
        results_timeout: Duration::from_secs(60),
        settle_delay: Duration::ZERO,
        price: PriceExtraction::Single {
            selector: r#"span[data-cy="pricing-main-price"]"#.to_string(),
        },
        poll_interval: DEFAULT_POLL_INTERVAL,
    }
}

pub fn register365() -> SiteProfile {
    SiteProfile {
        registrar: Registrar::Register365,
        enabled: true,
        entry_url: "https://www.register365.com/domain-names".to_string(),
        navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        launch: LaunchOptions {
            headless: true,
            window_size: Some((1280, 800)),
            args: stealth_args(),
        },
        user_agent: None,
        consent: None,
        search: Some(SearchStep {
            input_selector: r#"input[name="keyword"]"#.to_string(),
            input_timeout: Duration::from_secs(20),
            submit: SubmitMode::Form("form.domain-search-form".to_string()),
        }),
        results_selector: "div.domsearch-result".to_string(),
        results_timeout: Duration::from_secs(60),
        // 結果容器出現後價格還要幾秒才會渲染
        settle_delay: Duration::from_secs(5),
        price: PriceExtraction::Composite {
            marker: "div.domsearch-result span.u-text-promo".to_string(),
            major: r#"span[data-bind="text: components().major"]"#.to_string(),
            minor: r#"span[data-bind="text: components().minor"]"#.to_string(),
            currency: "€".to_string(),
            separator: ".".to_string(),
        },
        poll_interval: DEFAULT_POLL_INTERVAL,
    }
}

pub fn builtin(registrar: Registrar) -> SiteProfile {
    match registrar {
        Registrar::Namecheap => namecheap(),
        Registrar::GoDaddy => godaddy(),
        Registrar::Register365 => register365(),
    }
}

pub fn builtin_profiles() -> Vec<SiteProfile> {
    Registrar::ALL.into_iter().map(builtin).collect()
}

use crate::domain::model::{ComparisonResponse, PriceQuery};
use crate::utils::error::{CompareError, Result};
use reqwest::Client;
use std::fmt::Write;
use url::Url;

pub const EXTENSIONS: [&str; 5] = ["com", "net", "io", "org", "ie"];
pub const FETCH_FAILED: &str = "Failed to fetch domain prices.";
pub const LOADING: &str = "Fetching prices...";

/// 畫面狀態：送出前、查詢中、結果、錯誤
#[derive(Debug, Clone, PartialEq)]
pub enum ClientView {
    Idle,
    Loading { query: PriceQuery },
    Results { query: PriceQuery, prices: ComparisonResponse },
    Failed { message: String },
}

impl ClientView {
    pub fn render(&self) -> String {
        match self {
            ClientView::Idle => "Domain Price Comparator".to_string(),
            ClientView::Loading { .. } => LOADING.to_string(),
            ClientView::Failed { message } => message.clone(),
            ClientView::Results { query, prices } => {
                let mut out = format!("Prices for {}\n", query);
                for (registrar, price) in &prices.prices {
                    let _ = writeln!(
                        out,
                        "  {}: {}  Buy on {}: {}",
                        registrar,
                        price,
                        registrar,
                        registrar.purchase_url(query)
                    );
                }
                out
            }
        }
    }
}

pub struct CompareClient {
    http: Client,
    endpoint: Url,
}

impl CompareClient {
    /// `base` 可以是服務根網址或完整的 `/compare` 網址
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            endpoint: compare_url(base)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn fetch(&self, query: &PriceQuery) -> Result<ComparisonResponse> {
        tracing::debug!("Requesting {} for {}", self.endpoint, query);

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("domain", &query.domain), ("extension", &query.extension)])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Compare response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompareError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// 一次請求，不重試；失敗時回到錯誤狀態
    pub async fn search(&self, query: PriceQuery, mut on_view: impl FnMut(&ClientView)) -> ClientView {
        on_view(&ClientView::Loading { query: query.clone() });

        let view = match self.fetch(&query).await {
            Ok(prices) => ClientView::Results { query, prices },
            Err(e) => {
                tracing::warn!("Compare request failed: {}", e);
                ClientView::Failed {
                    message: FETCH_FAILED.to_string(),
                }
            }
        };

        on_view(&view);
        view
    }
}

pub fn compare_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| CompareError::InvalidConfigValueError {
        field: "endpoint".to_string(),
        value: base.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })?;

    if !url.path().trim_end_matches('/').ends_with("/compare") {
        let path = format!("{}/compare", url.path().trim_end_matches('/'));
        url.set_path(&path);
    }
    Ok(url)
}

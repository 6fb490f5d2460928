use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{CompareError, Result};

pub const UNAVAILABLE: &str = "Unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registrar {
    Namecheap,
    GoDaddy,
    Register365,
}

impl Registrar {
    pub const ALL: [Registrar; 3] = [Registrar::Namecheap, Registrar::GoDaddy, Registrar::Register365];

    /// 回應 JSON 與設定檔使用的鍵名
    pub fn key(&self) -> &'static str {
        match self {
            Registrar::Namecheap => "namecheap",
            Registrar::GoDaddy => "godaddy",
            Registrar::Register365 => "register365",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Registrar::Namecheap => "Namecheap",
            Registrar::GoDaddy => "GoDaddy",
            Registrar::Register365 => "Register365",
        }
    }

    /// 購買連結，使用與查詢相同的 domain + extension
    pub fn purchase_url(&self, query: &PriceQuery) -> String {
        match self {
            Registrar::Namecheap => format!(
                "https://www.namecheap.com/domains/registration/results/?domain={}",
                query.fqdn()
            ),
            Registrar::GoDaddy => format!(
                "https://www.godaddy.com/domainsearch/find?domainToCheck={}",
                query.fqdn()
            ),
            Registrar::Register365 => format!(
                "https://www.register365.com/search/domain?keyword={}&suffix=.{}",
                query.domain, query.extension
            ),
        }
    }
}

impl fmt::Display for Registrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Registrar {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self> {
        Registrar::ALL
            .into_iter()
            .find(|r| r.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CompareError::InvalidConfigValueError {
                field: "registrar".to_string(),
                value: s.to_string(),
                reason: "Expected one of: namecheap, godaddy, register365".to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuery {
    pub domain: String,
    pub extension: String,
}

impl PriceQuery {
    /// 兩個欄位都必須存在且非空白；extension 前導的 `.` 會被移除
    pub fn new(domain: &str, extension: &str) -> Result<Self> {
        let domain = domain.trim();
        let extension = extension.trim();
        let extension = extension.strip_prefix('.').unwrap_or(extension);

        if domain.is_empty() || extension.is_empty() {
            return Err(CompareError::ValidationError {
                message: "Domain and extension are required.".to_string(),
            });
        }

        Ok(Self {
            domain: domain.to_string(),
            extension: extension.to_string(),
        })
    }

    pub fn from_optional(domain: Option<&str>, extension: Option<&str>) -> Result<Self> {
        match (domain, extension) {
            (Some(domain), Some(extension)) => Self::new(domain, extension),
            _ => Err(CompareError::ValidationError {
                message: "Domain and extension are required.".to_string(),
            }),
        }
    }

    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.domain, self.extension)
    }
}

impl fmt::Display for PriceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.extension)
    }
}

/// 價格是不透明的顯示字串 (可能帶幣別符號)，從不做數值運算
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceQuote {
    Quoted(String),
    Unavailable,
}

impl PriceQuote {
    pub fn is_available(&self) -> bool {
        matches!(self, PriceQuote::Quoted(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            PriceQuote::Quoted(price) => price,
            PriceQuote::Unavailable => UNAVAILABLE,
        }
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PriceQuote {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PriceQuote {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == UNAVAILABLE {
            Ok(PriceQuote::Unavailable)
        } else {
            Ok(PriceQuote::Quoted(raw))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceResult {
    pub source: Registrar,
    pub price: PriceQuote,
}

impl PriceResult {
    pub fn quoted(source: Registrar, price: impl Into<String>) -> Self {
        Self {
            source,
            price: PriceQuote::Quoted(price.into()),
        }
    }

    pub fn unavailable(source: Registrar) -> Self {
        Self {
            source,
            price: PriceQuote::Unavailable,
        }
    }
}

/// 每個請求重新建立的 `registrar -> price` 對照表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonResponse {
    pub prices: BTreeMap<Registrar, PriceQuote>,
}

impl ComparisonResponse {
    pub fn get(&self, registrar: Registrar) -> Option<&PriceQuote> {
        self.prices.get(&registrar)
    }

    pub fn unavailable_count(&self) -> usize {
        self.prices.values().filter(|p| !p.is_available()).count()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<PriceResult> for ComparisonResponse {
    fn from_iter<I: IntoIterator<Item = PriceResult>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().map(|r| (r.source, r.price)).collect(),
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    BrowserError(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Browser launch failed: {message}")]
    LaunchError { message: String },

    #[error("Navigation to {url} failed: {message}")]
    NavigationError { url: String, message: String },

    #[error("Timed out after {waited_ms}ms waiting for '{selector}'")]
    TimeoutError { selector: String, waited_ms: u128 },

    #[error("Element not found: '{selector}'")]
    ElementNotFound { selector: String },

    #[error("Price element '{selector}' missing after results loaded")]
    PriceElementMissing { selector: String },

    #[error("Scraper panicked: {message}")]
    ScraperPanic { message: String },

    #[error("Comparison failed: {message}")]
    OrchestrationError { message: String },

    #[error("Unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, CompareError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Browser,
    Scrape,
    Orchestration,
    Configuration,
    Validation,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CompareError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CompareError::HttpError(_) | CompareError::UnexpectedStatus { .. } => {
                ErrorCategory::Network
            }
            CompareError::BrowserError(_)
            | CompareError::LaunchError { .. }
            | CompareError::NavigationError { .. } => ErrorCategory::Browser,
            CompareError::TimeoutError { .. }
            | CompareError::ElementNotFound { .. }
            | CompareError::PriceElementMissing { .. }
            | CompareError::ScraperPanic { .. } => ErrorCategory::Scrape,
            CompareError::OrchestrationError { .. } => ErrorCategory::Orchestration,
            CompareError::ConfigError { .. }
            | CompareError::InvalidConfigValueError { .. }
            | CompareError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            CompareError::ValidationError { .. } => ErrorCategory::Validation,
            CompareError::IoError(_) | CompareError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一來源失敗只會降級為 Unavailable
            ErrorCategory::Scrape => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Browser => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::Orchestration => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 頁面已載入但價格元素不見，通常代表外部網站改版
    pub fn is_markup_drift(&self) -> bool {
        matches!(self, CompareError::PriceElementMissing { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CompareError::HttpError(_) | CompareError::UnexpectedStatus { .. } => {
                "Check that the comparison service is running and the endpoint URL is correct"
            }
            CompareError::BrowserError(_) | CompareError::LaunchError { .. } => {
                "Make sure Chrome or Chromium is installed and can be started by this user"
            }
            CompareError::NavigationError { .. } | CompareError::TimeoutError { .. } => {
                "The registrar site may be slow or blocking automation; try again later"
            }
            CompareError::ElementNotFound { .. } | CompareError::PriceElementMissing { .. } => {
                "The registrar markup probably changed; inspect the diagnostics snapshot and update the site selectors"
            }
            CompareError::ScraperPanic { .. } | CompareError::OrchestrationError { .. } => {
                "Check the service logs for the failing source"
            }
            CompareError::ConfigError { .. }
            | CompareError::InvalidConfigValueError { .. }
            | CompareError::ConfigValidationError { .. } => {
                "Review the configuration file and command line flags"
            }
            CompareError::ValidationError { .. } => "Provide both a domain and an extension",
            CompareError::IoError(_) => "Check file permissions and available disk space",
            CompareError::SerializationError(_) => "The response was not valid JSON",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => "Failed to fetch domain prices.".to_string(),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Validation => "Domain and extension are required.".to_string(),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_errors_are_low_severity() {
        let err = CompareError::TimeoutError {
            selector: "div.result".to_string(),
            waited_ms: 20_000,
        };
        assert_eq!(err.category(), ErrorCategory::Scrape);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(!err.is_markup_drift());
    }

    #[test]
    fn test_price_missing_is_markup_drift() {
        let err = CompareError::PriceElementMissing {
            selector: "span.price".to_string(),
        };
        assert!(err.is_markup_drift());
        assert!(err.recovery_suggestion().contains("selectors"));
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = CompareError::InvalidConfigValueError {
            field: "server.port".to_string(),
            value: "0".to_string(),
            reason: "Port must be between 1 and 65535".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("Invalid configuration"));
    }
}

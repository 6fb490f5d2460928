pub mod comparator;
pub mod diagnostics;
pub mod profile;
pub mod scraper;

pub use crate::domain::model::{ComparisonResponse, PriceQuery, PriceQuote, PriceResult, Registrar};
pub use crate::domain::ports::{BrowserSession, PriceSource, SessionLauncher, Storage};
pub use crate::utils::error::Result;

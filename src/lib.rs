pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{chrome::ChromeLauncher, storage::LocalStorage};
pub use app::client::CompareClient;
pub use config::ServiceSettings;
pub use core::{comparator::PriceComparator, scraper::SiteScraper};
pub use domain::model::{ComparisonResponse, PriceQuery, PriceQuote, PriceResult, Registrar};
pub use utils::error::{CompareError, Result};

use crate::adapters::storage::LocalStorage;
use crate::config::ServiceSettings;
use crate::core::comparator::PriceComparator;
use crate::core::diagnostics::DiagnosticsRecorder;
use crate::core::profile::SiteProfile;
use crate::core::scraper::SiteScraper;
use crate::domain::ports::{PriceSource, SessionLauncher, Storage};
use std::sync::Arc;

/// 每個啟用的站點設定建立一個爬蟲，共用同一個 launcher 與診斷輸出
pub fn build_sources<'a, S: Storage + 'static>(
    profiles: impl IntoIterator<Item = &'a SiteProfile>,
    launcher: Arc<dyn SessionLauncher>,
    diagnostics: Arc<DiagnosticsRecorder<S>>,
) -> Vec<Arc<dyn PriceSource>> {
    profiles
        .into_iter()
        .filter(|profile| profile.enabled)
        .map(|profile| {
            Arc::new(SiteScraper::new(
                profile.clone(),
                launcher.clone(),
                diagnostics.clone(),
            )) as Arc<dyn PriceSource>
        })
        .collect()
}

pub fn build_comparator(settings: &ServiceSettings, launcher: Arc<dyn SessionLauncher>) -> PriceComparator {
    let diagnostics = match &settings.diagnostics_dir {
        Some(dir) => DiagnosticsRecorder::new(LocalStorage::new(dir.clone())),
        None => DiagnosticsRecorder::disabled(),
    };

    let sources = build_sources(settings.enabled_profiles(), launcher, Arc::new(diagnostics));
    tracing::info!(
        "Configured sources: {}",
        sources
            .iter()
            .map(|s| s.registrar().key())
            .collect::<Vec<_>>()
            .join(", ")
    );

    PriceComparator::new_with_monitoring(sources, settings.monitor)
}

use crate::domain::model::{ComparisonResponse, PriceQuery};
use crate::domain::ports::PriceSource;
use crate::utils::error::{CompareError, Result};
use crate::utils::monitor::SystemMonitor;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// 同時向所有註冊商查價，等全部結束後組成回應
pub struct PriceComparator {
    sources: Vec<Arc<dyn PriceSource>>,
    monitor: SystemMonitor,
}

impl PriceComparator {
    pub fn new(sources: Vec<Arc<dyn PriceSource>>) -> Self {
        Self::new_with_monitoring(sources, false)
    }

    pub fn new_with_monitoring(sources: Vec<Arc<dyn PriceSource>>, monitor_enabled: bool) -> Self {
        Self {
            sources,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn monitor(&self) -> &SystemMonitor {
        &self.monitor
    }

    fn check_sources(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(CompareError::OrchestrationError {
                message: "no price sources are enabled".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.registrar()) {
                return Err(CompareError::OrchestrationError {
                    message: format!("registrar {} is configured more than once", source.registrar()),
                });
            }
        }

        Ok(())
    }

    /// 單一來源的失敗只會變成 `Unavailable`；只有來源設定本身有問題才回傳錯誤
    pub async fn compare(&self, query: &PriceQuery) -> Result<ComparisonResponse> {
        self.check_sources()?;

        let started = Instant::now();
        tracing::info!(
            "🔎 Comparing prices for {} across {} sources",
            query,
            self.sources.len()
        );

        let results = join_all(self.sources.iter().map(|source| source.fetch_price(query))).await;
        let response: ComparisonResponse = results.into_iter().collect();

        tracing::info!(
            domain = %query,
            sources = response.len(),
            unavailable = response.unavailable_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "✅ Comparison finished"
        );
        self.monitor.log_stats("After comparison");

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{PriceQuote, PriceResult, Registrar};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticSource {
        registrar: Registrar,
        price: Option<&'static str>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(registrar: Registrar, price: Option<&'static str>) -> Self {
            Self {
                registrar,
                price,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl PriceSource for StaticSource {
        fn registrar(&self) -> Registrar {
            self.registrar
        }

        async fn fetch_price(&self, _query: &PriceQuery) -> PriceResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match self.price {
                Some(price) => PriceResult::quoted(self.registrar, price),
                None => PriceResult::unavailable(self.registrar),
            }
        }
    }

    fn query() -> PriceQuery {
        PriceQuery::new("example", "com").unwrap()
    }

    #[tokio::test]
    async fn test_compare_collects_every_source() {
        let comparator = PriceComparator::new(vec![
            Arc::new(StaticSource::new(Registrar::Namecheap, Some("$9.58"))),
            Arc::new(StaticSource::new(Registrar::Register365, Some("€12.99"))),
        ]);

        let response = comparator.compare(&query()).await.unwrap();

        assert_eq!(response.len(), 2);
        assert_eq!(
            response.get(Registrar::Namecheap),
            Some(&PriceQuote::Quoted("$9.58".to_string()))
        );
        assert_eq!(
            response.get(Registrar::Register365),
            Some(&PriceQuote::Quoted("€12.99".to_string()))
        );
    }

    #[tokio::test]
    async fn test_one_unavailable_source_does_not_affect_others() {
        let comparator = PriceComparator::new(vec![
            Arc::new(StaticSource::new(Registrar::Namecheap, Some("$9.58"))),
            Arc::new(StaticSource::new(Registrar::Register365, None)),
        ]);

        let response = comparator.compare(&query()).await.unwrap();

        assert_eq!(response.unavailable_count(), 1);
        assert_eq!(response.get(Registrar::Register365), Some(&PriceQuote::Unavailable));
        assert!(response.get(Registrar::Namecheap).unwrap().is_available());
    }

    #[tokio::test]
    async fn test_sources_run_concurrently() {
        let delay = Duration::from_millis(200);
        let comparator = PriceComparator::new(vec![
            Arc::new(StaticSource::new(Registrar::Namecheap, Some("$1")).with_delay(delay)),
            Arc::new(StaticSource::new(Registrar::GoDaddy, Some("$2")).with_delay(delay)),
            Arc::new(StaticSource::new(Registrar::Register365, Some("€3")).with_delay(delay)),
        ]);

        let started = Instant::now();
        let response = comparator.compare(&query()).await.unwrap();

        assert_eq!(response.len(), 3);
        // 依序執行至少需要 600ms
        assert!(started.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn test_empty_source_set_is_orchestration_error() {
        let comparator = PriceComparator::new(Vec::new());
        let err = comparator.compare(&query()).await.unwrap_err();
        assert!(matches!(err, CompareError::OrchestrationError { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_registrar_is_rejected_before_scraping() {
        let first = Arc::new(StaticSource::new(Registrar::Namecheap, Some("$1")));
        let second = Arc::new(StaticSource::new(Registrar::Namecheap, Some("$2")));
        let sources: Vec<Arc<dyn PriceSource>> = vec![first.clone(), second.clone()];
        let comparator = PriceComparator::new(sources);

        let err = comparator.compare(&query()).await.unwrap_err();

        assert!(matches!(err, CompareError::OrchestrationError { .. }));
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }
}

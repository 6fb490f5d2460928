use crate::domain::model::Registrar;
use crate::domain::ports::{PageSnapshot, Storage};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

/// 價格元素消失時保存頁面截圖與 HTML，供離線排查選擇器失效
pub struct DiagnosticsRecorder<S: Storage> {
    storage: Option<S>,
}

impl<S: Storage> DiagnosticsRecorder<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub fn disabled() -> Self {
        Self { storage: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.storage.is_some()
    }

    pub fn artifact_stem(registrar: Registrar, at: DateTime<Utc>) -> String {
        format!("{}-{}-no-price", registrar.key(), at.format("%Y%m%dT%H%M%S%3fZ"))
    }

    /// 回傳寫入的檔名；停用時回傳空清單
    pub async fn record_missing_price(
        &self,
        registrar: Registrar,
        snapshot: &PageSnapshot,
    ) -> Result<Vec<String>> {
        let Some(storage) = &self.storage else {
            return Ok(Vec::new());
        };

        let stem = Self::artifact_stem(registrar, Utc::now());
        let mut written = Vec::new();

        if !snapshot.screenshot_png.is_empty() {
            let name = format!("{}.png", stem);
            storage.write_file(&name, &snapshot.screenshot_png).await?;
            written.push(name);
        }

        let name = format!("{}.html", stem);
        storage.write_file(&name, snapshot.html.as_bytes()).await?;
        written.push(name);

        tracing::debug!("Saved diagnostics for {}: {:?}", registrar, written);
        Ok(written)
    }
}

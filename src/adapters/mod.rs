// Adapters layer: concrete implementations for external systems (browser, local storage).

pub mod chrome;
pub mod storage;

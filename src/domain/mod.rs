// Domain layer: request/response models and the ports (traits) the scrapers and the endpoint depend on.

pub mod model;
pub mod ports;

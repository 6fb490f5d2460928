pub mod client;
pub mod registrars;
pub mod server;
pub mod service;

pub mod chat;
pub mod error;
pub mod telemetry;
pub mod timeline;

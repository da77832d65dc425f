mod assistant;
mod client;
mod coalesce;
mod error;
mod transport;
mod types;

pub use assistant::{Assistant, Reply};
pub use client::{
    ClientSettings, GenerativeClient, RetryPolicy, DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT,
    DEFAULT_MODEL,
};
pub use coalesce::CoalescingClient;
pub use error::GenAiError;

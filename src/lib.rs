//! Daily Readings fetches the day's Mass readings, adds a short reflection
//! and emails them to subscribers.

pub mod config;
pub mod delivery;
pub mod error;
pub mod http;
pub mod llm;
pub mod pipeline;
pub mod readings;
pub mod reflection;
pub mod render;
pub mod scheduler;
pub mod store;

//! Fetching the readings page and extracting its sections.

pub mod extract;
pub mod fetcher;
pub mod model;
pub mod parser;

pub use fetcher::{HttpReadingsFetcher, RawReadings, ReadingsFetcher};
pub use model::ReadingSet;
pub use parser::ReadingsParser;

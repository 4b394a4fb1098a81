//! Reading set extracted from one day's readings page.

use serde::{Deserialize, Serialize};

/// The structured readings for a single date.
///
/// Built once per run by the parser and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSet {
    /// ISO `YYYY-MM-DD` date the readings belong to.
    pub date: String,
    pub source_url: String,
    pub feast_name: String,
    pub liturgical_color: String,
    pub first_reading: String,
    pub psalm: String,
    /// Always non-empty.
    pub gospel: String,
}

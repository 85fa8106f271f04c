use chrono::{DateTime, Utc};

/// Wall-clock access lives behind one call so tests can be deterministic
/// about ordering without mocking a clock trait.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

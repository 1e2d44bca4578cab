/// Identifiers are server-assigned UUID strings (client-generated only as a
/// placeholder before the server answers).
pub type EntityId = String;

/// Citizenship document rows use integer keys.
pub type CitizenshipId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar date with no time component (deadlines, due dates, spend dates).
pub type DateOnly = chrono::NaiveDate;

/// Monetary amounts in rupees. No rounding is applied client-side.
pub type Amount = f64;

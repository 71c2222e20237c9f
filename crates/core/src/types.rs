/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar date of a sale (no time component).
pub type SaleDate = chrono::NaiveDate;

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use super::labor::Labor;
use super::quantity::Quantity;
use super::worker::Worker;
use crate::catalog::NO_PEST;

/// Calendar day of a field activity, persisted as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordDate(Date);

impl RecordDate {
    /// Local calendar day, falling back to UTC when the local offset cannot
    /// be determined (multi-threaded test runners, some containers).
    pub fn today() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self(now.date())
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl FromStr for RecordDate {
    type Err = ParseRecordDateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
            .map(RecordDate)
            .map_err(|_| ParseRecordDateError {
                value: value.to_string(),
            })
    }
}

impl Serialize for RecordDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RecordDate::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

impl ToSql for RecordDate {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for RecordDate {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        RecordDate::from_str(value.as_str()?).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRecordDateError {
    value: String,
}

impl fmt::Display for ParseRecordDateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid date '{}': expected YYYY-MM-DD", self.value)
    }
}

impl Error for ParseRecordDateError {}

/// One logged field activity. Rows are append-only; nothing edits a record
/// once it has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub date: RecordDate,
    pub worker: Worker,
    pub crop: String,
    pub labor: Labor,
    pub pest: String,
    pub product: String,
    pub quantity: Quantity,
    pub notes: String,
}

impl FieldRecord {
    pub fn has_pest(&self) -> bool {
        self.pest != NO_PEST
    }
}

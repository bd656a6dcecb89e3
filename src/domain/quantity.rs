use std::error::Error;
use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Amount applied or worked (L / Kg / Horas). Always finite and >= 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Quantity(f64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0.0);

    pub fn new(value: f64) -> Result<Self, InvalidQuantity> {
        if !value.is_finite() {
            return Err(InvalidQuantity::NotFinite(value.to_string()));
        }
        if value < 0.0 {
            return Err(InvalidQuantity::Negative(value));
        }
        // normalizes -0.0 so it never reaches the store or the export
        Ok(Quantity(value + 0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Whole amounts keep one decimal place (`3.0`), matching the REAL column
/// as spreadsheets show it.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Quantity {
    type Err = InvalidQuantity;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        // decimal comma is common on the farm ("2,5")
        let normalized = if trimmed.contains('.') {
            trimmed.to_string()
        } else {
            trimmed.replacen(',', ".", 1)
        };
        let parsed = normalized
            .parse::<f64>()
            .map_err(|_| InvalidQuantity::NotANumber(value.to_string()))?;
        Quantity::new(parsed)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Quantity::new(raw).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Quantity {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Quantity {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = f64::column_result(value)?;
        Quantity::new(raw).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvalidQuantity {
    Negative(f64),
    NotFinite(String),
    NotANumber(String),
}

impl fmt::Display for InvalidQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidQuantity::Negative(value) => {
                write!(f, "quantity must be 0 or greater, got {}", value)
            }
            InvalidQuantity::NotFinite(value) => {
                write!(f, "quantity must be a finite number, got {}", value)
            }
            InvalidQuantity::NotANumber(value) => {
                write!(f, "quantity '{}' is not a number", value)
            }
        }
    }
}

impl Error for InvalidQuantity {}

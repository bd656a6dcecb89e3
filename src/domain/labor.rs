use std::error::Error;
use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::choice_key;

/// Kind of field work performed. Persisted and exported by display name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Labor {
    #[default]
    Monitoring,
    Treatment,
    Irrigation,
    Fertilizing,
    Pruning,
    Harvest,
}

impl Labor {
    pub const ALL: [Labor; 6] = [
        Labor::Monitoring,
        Labor::Treatment,
        Labor::Irrigation,
        Labor::Fertilizing,
        Labor::Pruning,
        Labor::Harvest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Labor::Monitoring => "Monitoreo de Plagas",
            Labor::Treatment => "Tratamiento Fito",
            Labor::Irrigation => "Riego",
            Labor::Fertilizing => "Abonado",
            Labor::Pruning => "Poda",
            Labor::Harvest => "Cosecha",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            Labor::Monitoring => "monitoring",
            Labor::Treatment => "treatment",
            Labor::Irrigation => "irrigation",
            Labor::Fertilizing => "fertilizing",
            Labor::Pruning => "pruning",
            Labor::Harvest => "harvest",
        }
    }
}

impl fmt::Display for Labor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Labor {
    type Err = ParseLaborError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let labor = match choice_key(value).as_str() {
            "monitoreodeplagas" | "monitoreo" | "monitoring" => Labor::Monitoring,
            "tratamientofito" | "tratamiento" | "treatment" => Labor::Treatment,
            "riego" | "irrigation" => Labor::Irrigation,
            "abonado" | "fertilizing" | "fertilizer" => Labor::Fertilizing,
            "poda" | "pruning" => Labor::Pruning,
            "cosecha" | "harvest" => Labor::Harvest,
            _ => {
                return Err(ParseLaborError {
                    value: value.to_string(),
                });
            }
        };
        Ok(labor)
    }
}

impl Serialize for Labor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Labor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Labor::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Labor {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Labor {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Labor::from_str(value.as_str()?).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLaborError {
    value: String,
}

impl fmt::Display for ParseLaborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid labor '{}': expected one of {}",
            self.value,
            Labor::ALL
                .iter()
                .map(|labor| format!("{} ({})", labor.as_str(), labor.alias()))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseLaborError {}

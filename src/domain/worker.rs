use std::error::Error;
use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::choice_key;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Worker {
    #[default]
    Owner,
    FirstHand,
    SecondHand,
}

impl Worker {
    pub const ALL: [Worker; 3] = [Worker::Owner, Worker::FirstHand, Worker::SecondHand];

    pub fn as_str(self) -> &'static str {
        match self {
            Worker::Owner => "Propietario",
            Worker::FirstHand => "Trabajador 1",
            Worker::SecondHand => "Trabajador 2",
        }
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Worker {
    type Err = ParseWorkerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match choice_key(value).as_str() {
            "propietario" | "owner" => Ok(Worker::Owner),
            "trabajador1" | "worker1" => Ok(Worker::FirstHand),
            "trabajador2" | "worker2" => Ok(Worker::SecondHand),
            _ => Err(ParseWorkerError {
                value: value.to_string(),
            }),
        }
    }
}

impl Serialize for Worker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Worker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Worker::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Worker {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Worker {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Worker::from_str(value.as_str()?).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWorkerError {
    value: String,
}

impl fmt::Display for ParseWorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid worker '{}': expected one of {}",
            self.value,
            Worker::ALL
                .iter()
                .map(|worker| worker.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseWorkerError {}

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::domain::choice_key;

const CATALOG_TOML: &str = include_str!("catalog.toml");

/// Pest value meaning "no pest detected". Always the first choice for a crop.
pub const NO_PEST: &str = "Ninguna";
const NO_PEST_ALIAS: &str = "none";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PestEntry {
    pub name: String,
    #[serde(default)]
    pub recommendation: String,
}

impl PestEntry {
    pub fn is_none(&self) -> bool {
        self.name == NO_PEST
    }
}

/// Pest choices for one crop. Construction guarantees that the first entry
/// is [`NO_PEST`] with an empty recommendation and that names are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PestList {
    entries: Vec<PestEntry>,
}

impl PestList {
    pub fn new(crop: &str, entries: Vec<PestEntry>) -> Result<Self, CatalogError> {
        let Some(first) = entries.first() else {
            return Err(CatalogError::InvalidDefinition(format!(
                "crop '{}' has no pest entries",
                crop
            )));
        };
        if !first.is_none() {
            return Err(CatalogError::InvalidDefinition(format!(
                "crop '{}' must list '{}' first, found '{}'",
                crop, NO_PEST, first.name
            )));
        }
        if !first.recommendation.trim().is_empty() {
            return Err(CatalogError::InvalidDefinition(format!(
                "crop '{}' has a recommendation for '{}'",
                crop, NO_PEST
            )));
        }

        let marker = treatment_marker(crop);
        let mut seen = HashMap::new();
        for entry in &entries {
            let key = choice_key(&entry.name);
            if key.is_empty() {
                return Err(CatalogError::InvalidDefinition(format!(
                    "crop '{}' has a pest with an empty name",
                    crop
                )));
            }
            if key == NO_PEST_ALIAS && !entry.is_none() {
                return Err(CatalogError::InvalidDefinition(format!(
                    "crop '{}' uses reserved pest name '{}'",
                    crop, entry.name
                )));
            }
            if seen.insert(key, entry.name.as_str()).is_some() {
                return Err(CatalogError::InvalidDefinition(format!(
                    "crop '{}' lists pest '{}' more than once",
                    crop, entry.name
                )));
            }
            if entry.is_none() {
                continue;
            }
            if !entry.recommendation.starts_with(&marker) {
                return Err(CatalogError::InvalidDefinition(format!(
                    "recommendation for '{}' in crop '{}' must start with '{}'",
                    entry.name, crop, marker
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The default selection; always [`NO_PEST`].
    pub fn first(&self) -> &PestEntry {
        &self.entries[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PestEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Finds a pest by name. Matching ignores case and separators, and
    /// `none` selects the sentinel.
    pub fn find(&self, raw: &str) -> Option<&PestEntry> {
        let key = choice_key(raw);
        if key == NO_PEST_ALIAS {
            return Some(self.first());
        }
        self.entries
            .iter()
            .find(|entry| choice_key(&entry.name) == key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }
}

impl Serialize for PestList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CropEntry {
    pub name: String,
    pub pests: PestList,
}

/// Advisory prefix every recommendation for `crop` carries.
pub fn treatment_marker(crop: &str) -> String {
    format!("TRATAMIENTO {}:", crop.to_uppercase())
}

#[derive(Debug, Clone, Deserialize)]
struct RawCatalogFile {
    #[serde(default)]
    crops: Vec<RawCropDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCropDefinition {
    name: String,
    #[serde(default)]
    pests: Vec<PestEntry>,
}

#[derive(Debug)]
pub enum CatalogError {
    Toml(toml::de::Error),
    InvalidDefinition(String),
    UnknownCrop(String),
    UnknownPest { crop: String, pest: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Toml(err) => write!(f, "invalid catalog TOML: {}", err),
            CatalogError::InvalidDefinition(message) => {
                write!(f, "invalid catalog definition: {}", message)
            }
            CatalogError::UnknownCrop(crop) => write!(f, "unknown crop '{}'", crop),
            CatalogError::UnknownPest { crop, pest } => {
                write!(f, "unknown pest '{}' for crop '{}'", pest, crop)
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CatalogError::Toml(err) => Some(err),
            CatalogError::InvalidDefinition(_) => None,
            CatalogError::UnknownCrop(_) => None,
            CatalogError::UnknownPest { .. } => None,
        }
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(value: toml::de::Error) -> Self {
        CatalogError::Toml(value)
    }
}

/// Immutable crop -> pest -> recommendation table.
#[derive(Debug, Clone)]
pub struct Catalog {
    crops: Vec<CropEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn load() -> Result<Self, CatalogError> {
        Self::from_toml(CATALOG_TOML)
    }

    pub(crate) fn from_toml(raw: &str) -> Result<Self, CatalogError> {
        let file: RawCatalogFile = toml::from_str(raw)?;
        if file.crops.is_empty() {
            return Err(CatalogError::InvalidDefinition(
                "at least one crop must be defined".to_string(),
            ));
        }

        let mut crops = Vec::with_capacity(file.crops.len());
        let mut index = HashMap::new();
        for raw_crop in file.crops {
            let name = raw_crop.name.trim().to_string();
            let key = choice_key(&name);
            if key.is_empty() {
                return Err(CatalogError::InvalidDefinition(
                    "crop name is required".to_string(),
                ));
            }
            if index.insert(key, crops.len()).is_some() {
                return Err(CatalogError::InvalidDefinition(format!(
                    "duplicate crop '{}' in catalog",
                    name
                )));
            }
            let pests = PestList::new(&name, raw_crop.pests)?;
            crops.push(CropEntry { name, pests });
        }

        Ok(Self { crops, index })
    }

    /// Crops in authored order.
    pub fn crops(&self) -> &[CropEntry] {
        &self.crops
    }

    pub fn crop_names(&self) -> impl Iterator<Item = &str> {
        self.crops.iter().map(|crop| crop.name.as_str())
    }

    pub fn default_crop(&self) -> &CropEntry {
        &self.crops[0]
    }

    pub fn crop(&self, raw: &str) -> Result<&CropEntry, CatalogError> {
        self.index
            .get(&choice_key(raw))
            .map(|position| &self.crops[*position])
            .ok_or_else(|| CatalogError::UnknownCrop(raw.trim().to_string()))
    }

    /// Resolves user input to canonical catalog entries. The pest entry
    /// carries the recommendation, empty for [`NO_PEST`].
    pub fn resolve(
        &self,
        crop: &str,
        pest: &str,
    ) -> Result<(&CropEntry, &PestEntry), CatalogError> {
        let crop_entry = self.crop(crop)?;
        let pest_entry = crop_entry
            .pests
            .find(pest)
            .ok_or_else(|| CatalogError::UnknownPest {
                crop: crop_entry.name.clone(),
                pest: pest.trim().to_string(),
            })?;
        Ok((crop_entry, pest_entry))
    }

    /// Exact-name membership check, as stored in a record.
    pub fn contains(&self, crop: &str, pest: &str) -> bool {
        self.crops
            .iter()
            .any(|entry| entry.name == crop && entry.pests.contains(pest))
    }
}

#[cfg(test)]
#[path = "catalog_tests_ext.rs"]
mod tests_ext;

//! Paper-size preset catalog.
//!
//! Presets are keyed by a stable identifier and carry their dimensions in
//! millimeters. Serialized field names keep the catalog service's wire
//! keys (`nombre`, `ancho`, `alto`, `descripcion`, `protegido`), so a
//! catalog loaded from the backing API round-trips unchanged.
//!
//! Built-in presets ship `protegido = true`: catalog management may read
//! them but every mutation or deletion is rejected with
//! [`CatalogError::ProtectedPreset`]. This is policy, not a fault: the
//! rejection is surfaced to the management UI as a user-facing message.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One paper-size catalog entry, dimensions in millimeters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaperPreset {
    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Paper width in millimeters.
    #[serde(rename = "ancho")]
    pub width_mm: f32,
    /// Paper height in millimeters.
    #[serde(rename = "alto")]
    pub height_mm: f32,
    /// Free-form description shown in catalog management.
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Protected presets cannot be edited or deleted.
    #[serde(rename = "protegido")]
    pub protected: bool,
}

/// Bounds for catalog growth and entry payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogLimits {
    /// Maximum number of presets held.
    pub max_presets: usize,
    /// Maximum UTF-8 byte length for preset names.
    pub max_name_bytes: usize,
    /// Maximum UTF-8 byte length for descriptions.
    pub max_description_bytes: usize,
}

impl Default for CatalogLimits {
    fn default() -> Self {
        Self {
            max_presets: 256,
            max_name_bytes: 128,
            max_description_bytes: 1024,
        }
    }
}

/// Paper preset catalog keyed by identifier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaperCatalog {
    presets: BTreeMap<String, PaperPreset>,
    limits: CatalogLimits,
}

impl PaperCatalog {
    /// Empty catalog with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty catalog with explicit limits.
    pub fn with_limits(limits: CatalogLimits) -> Self {
        Self {
            presets: BTreeMap::new(),
            limits,
        }
    }

    /// Catalog seeded with the built-in protected presets.
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        for (id, name, width_mm, height_mm, description) in [
            ("carta", "Carta", 216.0, 279.0, "Carta 216 x 279 mm"),
            ("oficio", "Oficio", 216.0, 340.0, "Oficio 216 x 340 mm"),
            ("a4", "A4", 210.0, 297.0, "ISO A4 210 x 297 mm"),
            ("a5", "A5", 148.0, 210.0, "ISO A5 148 x 210 mm"),
            (
                "media-carta",
                "Media carta",
                140.0,
                216.0,
                "Media carta 140 x 216 mm",
            ),
        ] {
            catalog.presets.insert(
                id.to_string(),
                PaperPreset {
                    name: name.to_string(),
                    width_mm,
                    height_mm,
                    description: description.to_string(),
                    protected: true,
                },
            );
        }
        catalog
    }

    /// Look up a preset by identifier.
    pub fn get(&self, id: &str) -> Option<&PaperPreset> {
        self.presets.get(id)
    }

    /// Number of presets held.
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// True when the catalog holds no presets.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Iterate identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Iterate entries in sorted identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PaperPreset)> {
        self.presets.iter().map(|(id, preset)| (id.as_str(), preset))
    }

    /// Insert a new preset or replace an existing unprotected one.
    pub fn upsert(&mut self, id: &str, preset: PaperPreset) -> Result<(), CatalogError> {
        self.check_entry(&preset)?;
        if let Some(existing) = self.presets.get(id) {
            if existing.protected {
                return Err(CatalogError::ProtectedPreset { id: id.into() });
            }
        } else if self.presets.len() >= self.limits.max_presets {
            return Err(CatalogError::LimitExceeded {
                kind: "catalog_presets",
                actual: self.presets.len() + 1,
                limit: self.limits.max_presets,
            });
        }
        self.presets.insert(id.to_string(), preset);
        Ok(())
    }

    /// Remove an unprotected preset.
    pub fn remove(&mut self, id: &str) -> Result<PaperPreset, CatalogError> {
        if self.presets.get(id).is_some_and(|preset| preset.protected) {
            log::warn!("rejected deletion of protected paper preset '{}'", id);
            return Err(CatalogError::ProtectedPreset { id: id.into() });
        }
        self.presets
            .remove(id)
            .ok_or_else(|| CatalogError::UnknownPreset { id: id.into() })
    }

    /// Serialize the catalog to JSON (id -> preset map).
    pub fn to_json(&self) -> Result<String, CatalogError> {
        serde_json::to_string(&self.presets).map_err(|err| CatalogError::Persistence {
            message: err.to_string().into_boxed_str(),
        })
    }

    /// Load a catalog from JSON produced by [`to_json`](Self::to_json) or
    /// by the backing catalog service.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let presets: BTreeMap<String, PaperPreset> =
            serde_json::from_str(json).map_err(|err| CatalogError::Persistence {
                message: err.to_string().into_boxed_str(),
            })?;
        Ok(Self {
            presets,
            limits: CatalogLimits::default(),
        })
    }

    fn check_entry(&self, preset: &PaperPreset) -> Result<(), CatalogError> {
        if preset.name.len() > self.limits.max_name_bytes {
            return Err(CatalogError::LimitExceeded {
                kind: "preset_name_bytes",
                actual: preset.name.len(),
                limit: self.limits.max_name_bytes,
            });
        }
        if preset.description.len() > self.limits.max_description_bytes {
            return Err(CatalogError::LimitExceeded {
                kind: "preset_description_bytes",
                actual: preset.description.len(),
                limit: self.limits.max_description_bytes,
            });
        }
        Ok(())
    }
}

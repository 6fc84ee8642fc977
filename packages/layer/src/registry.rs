//! Preset registry: choropleth configurations and their sample values
//! embedded from `packages/layer/presets/` and `packages/layer/data/`.
//!
//! To add a preset, drop a TOML file (and optionally a values file) next
//! to the others and add a row to the list below.

use std::path::Path;

use choropleth_map_models::ChoroplethConfig;

use crate::{LayerError, ValueTable};

/// `(id, config TOML, values JSON)` embedded at compile time.
const PRESETS: &[(&str, &str, &str)] = &[
    (
        "birmingham_imd",
        include_str!("../presets/birmingham_imd.toml"),
        include_str!("../data/birmingham_imd.json"),
    ),
    (
        "birmingham_imd_full_resolution",
        include_str!("../presets/birmingham_imd_full_resolution.toml"),
        include_str!("../data/birmingham_imd.json"),
    ),
];

#[cfg(test)]
const EXPECTED_PRESET_COUNT: usize = 2;

/// A bundled configuration together with its bundled values.
#[derive(Debug, Clone)]
pub struct Preset {
    /// The layer configuration.
    pub config: ChoroplethConfig,
    values: &'static str,
}

impl Preset {
    /// Parses the bundled value table.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the embedded values are malformed.
    pub fn values(&self) -> Result<ValueTable, LayerError> {
        ValueTable::from_json_str(self.values)
    }
}

/// Parses a configuration document.
///
/// # Errors
///
/// Returns [`LayerError::Toml`] if the document does not parse.
pub fn parse_config_toml(content: &str) -> Result<ChoroplethConfig, LayerError> {
    Ok(toml::from_str(content)?)
}

/// Reads and validates a configuration file.
///
/// # Errors
///
/// Returns [`LayerError`] if the file cannot be read, does not parse, or
/// fails validation.
pub fn load_config(path: &Path) -> Result<ChoroplethConfig, LayerError> {
    let config = parse_config_toml(&std::fs::read_to_string(path)?)?;
    config.validate()?;
    Ok(config)
}

/// Returns every embedded preset.
///
/// # Panics
///
/// Panics if an embedded TOML config is malformed.
#[must_use]
pub fn all_presets() -> Vec<Preset> {
    PRESETS
        .iter()
        .map(|(name, toml, values)| Preset {
            config: parse_config_toml(toml)
                .unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}")),
            values,
        })
        .collect()
}

/// Looks up an embedded preset by id.
///
/// # Errors
///
/// Returns [`LayerError::UnknownPreset`] if no preset has that id.
pub fn find_preset(id: &str) -> Result<Preset, LayerError> {
    all_presets()
        .into_iter()
        .find(|p| p.config.id == id)
        .ok_or_else(|| LayerError::UnknownPreset { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_presets() {
        assert_eq!(all_presets().len(), EXPECTED_PRESET_COUNT);
    }

    #[test]
    fn preset_ids_are_unique_and_match_rows() {
        let presets = all_presets();
        let mut ids: Vec<&str> = presets.iter().map(|p| p.config.id.as_str()).collect();
        for ((row_id, _, _), id) in PRESETS.iter().zip(&ids) {
            assert_eq!(row_id, id);
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXPECTED_PRESET_COUNT);
    }

    #[test]
    fn all_presets_validate() {
        for preset in &all_presets() {
            preset
                .config
                .validate()
                .unwrap_or_else(|e| panic!("{}: {e}", preset.config.id));
            assert_eq!(preset.config.palette.len(), 4);
        }
    }

    #[test]
    fn birmingham_values_parse() {
        let table = find_preset("birmingham_imd").unwrap().values().unwrap();
        assert_eq!(table.len(), 1242);
        assert!(table.values().all(|v| (1.0..=10.0).contains(&v)));
    }

    #[test]
    fn unknown_preset_is_an_error() {
        assert!(matches!(
            find_preset("nowhere"),
            Err(LayerError::UnknownPreset { id }) if id == "nowhere"
        ));
    }
}

//! Import options with TOML file support.
//!
//! Both sections use `#[serde(default)]` so a file overriding a single
//! field (e.g. only `[view] aspect_ratio`) works.

mod import;
mod view;

use std::path::Path;

pub use import::ImportBehavior;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use view::ViewOptions;

use crate::error::PseError;

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct ImportOptions {
    /// Target viewport for camera reconstruction.
    pub view: ViewOptions,
    /// Loading and command emission switches.
    pub import: ImportBehavior,
}

impl ImportOptions {
    /// Generate JSON Schema describing the options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ImportOptions)
    }

    /// Serialize the options as a compact JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, PseError> {
        let content = std::fs::read_to_string(path).map_err(PseError::Io)?;
        toml::from_str(&content)
            .map_err(|e| PseError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), PseError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PseError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(PseError::Io)?;
        }
        std::fs::write(path, content).map_err(PseError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = ImportOptions::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: ImportOptions = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[view]
aspect_ratio = 1.5
";
        let opts: ImportOptions = toml::from_str(toml_str).unwrap();
        assert_eq!(opts.view.aspect_ratio, 1.5);
        assert_eq!(opts.view.field_of_view, 20.0);
        assert!(opts.import.allow_surfaces);
        assert!(opts.import.honour_movie);
    }

    #[test]
    fn save_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("import.toml");
        let mut opts = ImportOptions::default();
        opts.import.allow_surfaces = false;
        opts.view.field_of_view = 35.0;
        opts.save(&path).unwrap();
        assert_eq!(ImportOptions::load(&path).unwrap(), opts);
    }

    #[test]
    fn malformed_file_is_options_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[view]\naspect_ratio = \"wide\"\n").unwrap();
        assert!(matches!(
            ImportOptions::load(&path),
            Err(PseError::OptionsParse(_))
        ));
        assert!(matches!(
            ImportOptions::load(&dir.path().join("missing.toml")),
            Err(PseError::Io(_))
        ));
    }

    #[test]
    fn json_view_names_both_sections() {
        let mut opts = ImportOptions::default();
        opts.import.load_hidden = false;
        let value: serde_json::Value =
            serde_json::from_str(&opts.to_json()).unwrap();
        assert_eq!(value["import"]["load_hidden"], false);
        assert!(value["view"]["field_of_view"].is_number());
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(ImportOptions::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();
        assert!(props.contains_key("view"));
        assert!(props.contains_key("import"));

        let view = &props["view"]["properties"];
        assert!(view.get("aspect_ratio").is_some());
        assert!(view.get("field_of_view").is_some());
        let import = &props["import"]["properties"];
        assert!(import.get("allow_surfaces").is_some());
        assert!(import.get("load_hidden").is_some());
    }
}

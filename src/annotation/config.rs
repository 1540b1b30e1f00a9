//! Class configuration: the class table, priority order and point radius.
//!
//! The built-in defaults describe the CT log dataset. A different setup can
//! be loaded from YAML or JSON:
//!
//! ```yaml
//! point_radius: 3
//! classes:
//!   background: 0
//!   wood: 10
//! priority: [wood, background]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::classes::{ClassPriority, ClassTable};
use crate::error::LogmaskError;

/// Default radius, in pixels, of the disc drawn for point annotations.
pub const DEFAULT_POINT_RADIUS: u32 = 3;

/// Largest accepted point radius; a disc this wide already covers any
/// image the pipeline accepts.
pub const MAX_POINT_RADIUS: u32 = 1 << 16;

const DEFAULT_CLASSES: &[(&str, u8)] = &[
    ("background", 0),
    ("compression_wood", 1),
    ("crack", 2),
    ("insects", 3),
    ("knot_sound", 4),
    ("moisture", 5),
    ("moisture_real", 6),
    ("pith", 7),
    ("resign_pocket", 8),
    ("rot", 9),
    ("wood", 10),
];

/// Best first.
const DEFAULT_PRIORITY: &[&str] = &[
    "knot_sound",
    "crack",
    "insects",
    "rot",
    "resign_pocket",
    "pith",
    "moisture",
    "moisture_real",
    "compression_wood",
    "wood",
    "background",
];

/// On-disk form of a class configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassConfigFile {
    #[serde(default = "default_point_radius")]
    pub point_radius: u32,

    pub classes: BTreeMap<String, u8>,

    #[serde(default)]
    pub priority: Vec<String>,
}

fn default_point_radius() -> u32 {
    DEFAULT_POINT_RADIUS
}

/// Validated, immutable configuration shared by every rasterization.
#[derive(Clone, Debug)]
pub struct ClassConfig {
    table: ClassTable,
    priority: ClassPriority,
    priority_names: Vec<String>,
    point_radius: u32,
}

impl ClassConfig {
    /// Builds a configuration from class entries and a best-first priority list.
    pub fn new<S: AsRef<str>>(
        classes: impl IntoIterator<Item = (S, u8)>,
        priority: &[S],
        point_radius: u32,
    ) -> Result<Self, LogmaskError> {
        check_point_radius(point_radius)?;
        let table = ClassTable::new(classes)?;
        let priority_order = ClassPriority::from_names(&table, priority)?;
        Ok(Self {
            table,
            priority: priority_order,
            priority_names: priority
                .iter()
                .map(|s| super::normalize_class_name(s.as_ref()))
                .collect(),
            point_radius,
        })
    }

    /// Builds a configuration from its on-disk form.
    pub fn from_file_repr(file: &ClassConfigFile) -> Result<Self, LogmaskError> {
        Self::new(
            file.classes.iter().map(|(k, v)| (k.as_str(), *v)),
            &file.priority.iter().map(String::as_str).collect::<Vec<_>>(),
            file.point_radius,
        )
    }

    /// Returns the on-disk form of this configuration.
    pub fn to_file_repr(&self) -> ClassConfigFile {
        ClassConfigFile {
            point_radius: self.point_radius,
            classes: self
                .table
                .iter()
                .map(|(name, id)| (name.to_string(), id.as_u8()))
                .collect(),
            priority: self.priority_names.clone(),
        }
    }

    /// Returns a copy with a different point radius.
    pub fn with_point_radius(mut self, radius: u32) -> Result<Self, LogmaskError> {
        check_point_radius(radius)?;
        self.point_radius = radius;
        Ok(self)
    }

    pub fn table(&self) -> &ClassTable {
        &self.table
    }

    pub fn priority(&self) -> &ClassPriority {
        &self.priority
    }

    /// Best-first priority names as configured.
    pub fn priority_names(&self) -> &[String] {
        &self.priority_names
    }

    pub fn point_radius(&self) -> u32 {
        self.point_radius
    }
}

impl Default for ClassConfig {
    fn default() -> Self {
        let table = ClassTable::from_trusted(DEFAULT_CLASSES);
        let priority = ClassPriority::from_trusted(&table, DEFAULT_PRIORITY);
        Self {
            table,
            priority,
            priority_names: DEFAULT_PRIORITY.iter().map(|s| s.to_string()).collect(),
            point_radius: DEFAULT_POINT_RADIUS,
        }
    }
}

fn check_point_radius(radius: u32) -> Result<(), LogmaskError> {
    if radius > MAX_POINT_RADIUS {
        return Err(LogmaskError::InvalidConfig(format!(
            "point radius {radius} exceeds the maximum of {MAX_POINT_RADIUS}"
        )));
    }
    Ok(())
}

/// Reads a class configuration from a YAML or JSON file.
///
/// The format is chosen by extension: `.json` is parsed as JSON, anything
/// else as YAML (which also accepts JSON documents).
pub fn read_class_config(path: &Path) -> Result<ClassConfig, LogmaskError> {
    let text = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let file: ClassConfigFile = if is_json {
        serde_json::from_str(&text).map_err(|e| LogmaskError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        serde_yaml::from_str(&text).map_err(|e| LogmaskError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    ClassConfig::from_file_repr(&file)
}

/// Parses a class configuration from a YAML string.
pub fn from_config_yaml_str(yaml: &str) -> Result<ClassConfig, LogmaskError> {
    let file: ClassConfigFile =
        serde_yaml::from_str(yaml).map_err(|e| LogmaskError::ConfigParse {
            path: "<string>".into(),
            message: e.to_string(),
        })?;
    ClassConfig::from_file_repr(&file)
}

//! Test scene format: tagged boxes plus a spawn point.
#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

const SUPPORTED_VERSION: u32 = 1;
const KNOWN_TAGS: [&str; 2] = ["ground", "ladder"];

#[derive(Clone, Debug, Deserialize)]
pub struct TestMap {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub spawn: Spawn,
    #[serde(default)]
    pub solids: Vec<SolidSpec>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Spawn {
    pub pos: [f32; 3],
    #[serde(default)]
    pub yaw_deg: f32,
}

impl Default for Spawn {
    fn default() -> Self {
        Self {
            pos: [0.0, 1.0, 0.0],
            yaw_deg: 0.0,
        }
    }
}

/// Axis-aligned box, optionally turned about +Y. `size` is the full extent.
#[derive(Clone, Debug, Deserialize)]
pub struct SolidSpec {
    pub id: String,
    pub pos: [f32; 3],
    pub size: [f32; 3],
    #[serde(default)]
    pub yaw_deg: Option<f32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SolidSpec {
    pub fn half_extents(&self) -> [f32; 3] {
        [self.size[0] * 0.5, self.size[1] * 0.5, self.size[2] * 0.5]
    }

    pub fn yaw_rad(&self) -> f32 {
        self.yaw_deg.unwrap_or(0.0).to_radians()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value == tag)
    }
}

#[derive(Clone, Debug, Default)]
pub struct TestMapValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl TestMapValidation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl TestMap {
    pub fn parse_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| format!("read {} failed: {}", path.display(), err))?;
        Self::parse_toml(&text).map_err(|err| format!("parse {} failed: {}", path.display(), err))
    }

    pub fn validate(&self) -> TestMapValidation {
        let mut validation = TestMapValidation::default();
        if self.version != SUPPORTED_VERSION {
            validation
                .errors
                .push(format!("unsupported version {}", self.version));
        }
        if !vector_is_finite(self.spawn.pos) || !self.spawn.yaw_deg.is_finite() {
            validation.errors.push("spawn must be finite".to_string());
        }
        if self.solids.is_empty() {
            validation
                .warnings
                .push("test map contains no solids".to_string());
        }
        let mut seen = HashSet::new();
        for solid in &self.solids {
            if solid.id.trim().is_empty() {
                validation
                    .errors
                    .push("solid id must not be empty".to_string());
            } else if !seen.insert(solid.id.as_str()) {
                validation
                    .errors
                    .push(format!("duplicate solid id '{}'", solid.id));
            }
            if !vector_is_finite(solid.pos) {
                validation
                    .errors
                    .push(format!("solid '{}' has invalid pos", solid.id));
            }
            if !vector_is_finite(solid.size) || solid.size.iter().any(|value| *value <= 0.0) {
                validation
                    .errors
                    .push(format!("solid '{}' has invalid size", solid.id));
            }
            if solid.yaw_deg.is_some_and(|yaw| !yaw.is_finite()) {
                validation
                    .errors
                    .push(format!("solid '{}' has invalid yaw_deg", solid.id));
            }
            for tag in &solid.tags {
                if !KNOWN_TAGS.contains(&tag.as_str()) {
                    validation.warnings.push(format!(
                        "solid '{}' has unknown tag '{}' (treated as untagged)",
                        solid.id, tag
                    ));
                }
            }
        }
        if !self.solids.iter().any(|solid| solid.has_tag("ground")) {
            validation
                .warnings
                .push("no solid is tagged 'ground'".to_string());
        }
        validation
    }

    pub fn solids_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a SolidSpec> + 'a {
        self.solids.iter().filter(move |solid| solid.has_tag(tag))
    }
}

fn vector_is_finite(value: [f32; 3]) -> bool {
    value.iter().all(|component| component.is_finite())
}

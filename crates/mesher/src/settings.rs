//! Mesher settings

use serde::{Deserialize, Serialize};

/// Tessellation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshingSettings {
    /// Linear deflection (max chordal deviation) passed to the kernel
    pub resolution: f64,
    /// Angular deflection as a multiple of `resolution`
    pub angular_deflection_factor: f64,
    /// Chords used to approximate iso-curve arclength
    pub iso_segments: usize,
    /// Angular deflection for free-edge polylines, in radians
    pub free_edge_angular_deflection: f64,
}

impl Default for MeshingSettings {
    fn default() -> Self {
        Self {
            resolution: 0.0025,
            angular_deflection_factor: 5.0,
            iso_segments: 5,
            free_edge_angular_deflection: 0.1,
        }
    }
}

impl MeshingSettings {
    pub fn angular_deflection(&self) -> f64 {
        self.resolution * self.angular_deflection_factor
    }
}

/// UV atlas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasSettings {
    /// Margin added to every island, in arclength units
    pub uv_padding: f64,
}

impl Default for AtlasSettings {
    fn default() -> Self {
        Self { uv_padding: 2.0 }
    }
}

/// Edge identity settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSettings {
    /// Modulus applied to kernel edge hashes
    pub hash_modulus: u64,
    /// Use the kernel's native edge identity instead of the hash when available
    pub prefer_native_identity: bool,
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self {
            hash_modulus: 100_000_000,
            prefer_native_identity: true,
        }
    }
}

/// All mesher settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MesherSettings {
    pub meshing: MeshingSettings,
    pub atlas: AtlasSettings,
    pub edges: EdgeSettings,
}

impl MesherSettings {
    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        if let Some(dirs) = directories::ProjectDirs::from("com", "shape-mesher", "shape-mesher") {
            let config_path = dirs.config_dir().join("settings.json");
            if let Ok(json) = std::fs::read_to_string(&config_path) {
                match serde_json::from_str(&json) {
                    Ok(settings) => return settings,
                    Err(e) => tracing::warn!("ignoring malformed {}: {}", config_path.display(), e),
                }
            }
        }
        Self::default()
    }

    /// Save settings to file
    pub fn save(&self) {
        if let Some(dirs) = directories::ProjectDirs::from("com", "shape-mesher", "shape-mesher") {
            let config_dir = dirs.config_dir();
            if std::fs::create_dir_all(config_dir).is_ok() {
                let config_path = config_dir.join("settings.json");
                if let Ok(json) = serde_json::to_string_pretty(self) {
                    let _ = std::fs::write(config_path, json);
                }
            }
        }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.meshing.resolution = resolution;
        self
    }
}

//! User settings and preferences
//!
//! Persisted in LocalStorage. World state is never saved; only these.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading configuration documents
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Radians of look rotation per pixel of mouse movement
    pub mouse_sensitivity: f32,
    /// Invert vertical mouse look
    pub invert_y: bool,
    /// Vertical field of view (degrees), read by the renderer
    pub field_of_view: f32,
    /// Longest frame delta the simulation will accept (seconds)
    pub max_frame_dt: f32,
    /// Show the vehicle help overlay
    pub show_help: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.002,
            invert_y: false,
            field_of_view: 75.0,
            max_frame_dt: 0.1,
            show_help: true,
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "voxel_craft_settings";

    /// Parse settings JSON, filling missing fields from defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mouse_sensitivity > 0.0 && self.mouse_sensitivity.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "mouse_sensitivity",
                value: self.mouse_sensitivity,
            });
        }
        if !(10.0..=150.0).contains(&self.field_of_view) {
            return Err(ConfigError::OutOfRange {
                field: "field_of_view",
                value: self.field_of_view,
            });
        }
        if !(self.max_frame_dt > 0.0 && self.max_frame_dt <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "max_frame_dt",
                value: self.max_frame_dt,
            });
        }
        Ok(())
    }

    /// Mouse delta (pixels) to look delta (radians), with Y inversion applied
    pub fn look_delta(&self, dx: f32, dy: f32) -> (f32, f32) {
        let dy = if self.invert_y { -dy } else { dy };
        (dx * self.mouse_sensitivity, dy * self.mouse_sensitivity)
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        let Some(storage) = storage else {
            log::warn!("LocalStorage unavailable, settings not saved");
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => match storage.set_item(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Failed to save settings: {:?}", e),
            },
            Err(e) => log::warn!("Failed to serialize settings: {}", e),
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let s = Settings::from_json(r#"{ "invert_y": true }"#).unwrap();
        assert!(s.invert_y);
        assert_eq!(s.mouse_sensitivity, 0.002);
        assert_eq!(s.max_frame_dt, 0.1);
    }

    #[test]
    fn rejects_out_of_range() {
        let err = Settings::from_json(r#"{ "field_of_view": 400.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "field_of_view",
                ..
            }
        ));
        assert!(Settings::from_json(r#"{ "mouse_sensitivity": 0.0 }"#).is_err());
    }

    #[test]
    fn rejects_bad_json() {
        assert!(matches!(
            Settings::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn look_delta_inverts_y() {
        let mut s = Settings::default();
        let (_, dy) = s.look_delta(0.0, 10.0);
        assert!(dy > 0.0);
        s.invert_y = true;
        let (_, dy) = s.look_delta(0.0, 10.0);
        assert!(dy < 0.0);
    }
}

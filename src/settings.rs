//! User settings and preferences
//!
//! Persisted in LocalStorage, separate from tuning.

use serde::{Deserialize, Serialize};

use crate::input::InputMode;
use crate::tuning::Tuning;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Ocean surface population for this preset
    pub fn ocean_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 4000,
            QualityPreset::Medium => 9000,
            QualityPreset::High => 15000,
        }
    }

    /// Spark pool capacity for this preset
    pub fn spark_capacity(&self) -> usize {
        match self {
            QualityPreset::Low => 1200,
            QualityPreset::Medium => 2400,
            QualityPreset::High => 3500,
        }
    }
}

/// Preferences the user can change from the menu
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Input mode picked last time (pre-selected on the title screen)
    pub preferred_input: InputMode,
    /// Reduced motion (camera rig stays put)
    pub reduced_motion: bool,
    /// Show the gesture debug readout
    pub show_debug_hud: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::High,
            preferred_input: InputMode::Pointer,
            reduced_motion: false,
            show_debug_hud: true,
        }
    }
}

impl Settings {
    /// Tuning with the preset's population sizes applied on top of `base`
    pub fn tuning(&self, base: &Tuning) -> Tuning {
        let mut tuning = base.clone();
        tuning.ocean.particle_count = self.quality.ocean_particles();
        tuning.fireworks.spark_capacity = self.quality.spark_capacity();
        tuning
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "tide_lights_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
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

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
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

// src/config.rs - Engine settings and per-symbol alarm configuration

use crate::alarm::{AlarmKind, AlarmPriority};
use crate::error::{AlarmError, Result};
use crate::threshold::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

// ============================================================================
// ENGINE SETTINGS
// ============================================================================

/// Runtime settings for the alarm engine.
///
/// Supplied by the host at construction time; the engine never mutates
/// them except through the explicit setters on the manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Master enable; `check_alarms` is a no-op when false
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Invoke the sounder on new alarms
    #[serde(default = "default_true")]
    pub sound_enabled: bool,

    /// Create new alarms already acknowledged by "System"
    #[serde(default)]
    pub auto_acknowledge: bool,

    /// Hysteresis band as a percentage of each limit
    #[serde(default = "default_hysteresis")]
    pub hysteresis_percent: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound_enabled: true,
            auto_acknowledge: false,
            hysteresis_percent: default_hysteresis(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hysteresis() -> f64 {
    2.0
}

fn default_priority() -> u8 {
    2
}

// ============================================================================
// PER-SYMBOL CONFIGURATION
// ============================================================================

/// Whether a symbol carries analog limits or a boolean alarm flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolCategory {
    /// Numeric process value checked against up to four limits
    Analog,
    /// Boolean flag; active exactly while true
    Digital,
}

/// The analog limits configured for one symbol. Absent limits are not
/// evaluated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitSet {
    /// Critical upper limit
    #[serde(default)]
    pub high_high: Option<f64>,
    /// Upper limit
    #[serde(default)]
    pub high: Option<f64>,
    /// Lower limit
    #[serde(default)]
    pub low: Option<f64>,
    /// Critical lower limit
    #[serde(default)]
    pub low_low: Option<f64>,
}

impl LimitSet {
    /// The configured limits, each with its alarm kind and comparison
    /// direction, in the evaluation order the engine uses.
    pub fn entries(&self) -> Vec<(AlarmKind, f64, Direction)> {
        let mut out = Vec::with_capacity(4);
        if let Some(l) = self.high_high {
            out.push((AlarmKind::HighHigh, l, Direction::RisingBound));
        }
        if let Some(l) = self.high {
            out.push((AlarmKind::High, l, Direction::RisingBound));
        }
        if let Some(l) = self.low {
            out.push((AlarmKind::Low, l, Direction::FallingBound));
        }
        if let Some(l) = self.low_low {
            out.push((AlarmKind::LowLow, l, Direction::FallingBound));
        }
        out
    }

    /// True if no limit is configured.
    pub fn is_empty(&self) -> bool {
        self.high_high.is_none() && self.high.is_none() && self.low.is_none() && self.low_low.is_none()
    }

    /// Build a limit set from the raw string attributes the discovery
    /// pipeline extracts from symbol metadata (`AlarmHighHigh="95.0"`,
    /// ...). A value that fails to parse as a number is skipped with a
    /// warning; the remaining limits stay usable.
    pub fn from_attributes(symbol: &str, attrs: &HashMap<String, String>) -> Self {
        let parse = |key: &str| -> Option<f64> {
            let raw = attrs.get(key)?;
            match raw.parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Skipping unparsable {} limit for '{}': '{}'", key, symbol, raw);
                    None
                }
            }
        };
        Self {
            high_high: parse("AlarmHighHigh"),
            high: parse("AlarmHigh"),
            low: parse("AlarmLow"),
            low_low: parse("AlarmLowLow"),
        }
    }
}

/// Alarm configuration for one monitored symbol.
///
/// Produced by the external configuration/discovery pipeline and consumed
/// read-only by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolAlarmConfig {
    /// Monitored point identifier
    pub name: String,

    /// Analog or digital evaluation
    pub category: SymbolCategory,

    /// Alarm evaluation enabled for this symbol
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Analog limits; ignored for digital symbols
    #[serde(default)]
    pub limits: LimitSet,

    /// Numeric priority level (1-4), applied to every limit of the symbol
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Engineering unit for messages
    #[serde(default)]
    pub unit: String,

    /// Message override for digital alarms
    #[serde(default)]
    pub alarm_text: Option<String>,
}

impl SymbolAlarmConfig {
    /// Priority as the closed enum.
    pub fn alarm_priority(&self) -> AlarmPriority {
        AlarmPriority::from_level(self.priority)
    }
}

// ============================================================================
// TOP-LEVEL CONFIGURATION
// ============================================================================

/// Complete alarm engine configuration as loaded from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmEngineConfig {
    /// Engine-wide settings
    #[serde(default)]
    pub settings: EngineSettings,

    /// Per-symbol alarm configurations
    #[serde(default)]
    pub symbols: Vec<SymbolAlarmConfig>,
}

impl AlarmEngineConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints the YAML schema cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.settings.hysteresis_percent < 0.0 {
            return Err(AlarmError::Config(format!(
                "hysteresis_percent must be non-negative, got {}",
                self.settings.hysteresis_percent
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for symbol in &self.symbols {
            if symbol.name.is_empty() {
                return Err(AlarmError::Config("symbol with empty name".to_string()));
            }
            if !seen.insert(symbol.name.as_str()) {
                return Err(AlarmError::Config(format!(
                    "duplicate symbol '{}'",
                    symbol.name
                )));
            }
        }
        Ok(())
    }
}

//! SENTRA - Supervisory alarm detection and lifecycle engine
//!
//! The alerting core of a supervisory monitoring tool: hysteresis-based
//! threshold evaluation, an `Active -> Acknowledged -> Cleared` alarm
//! state machine, priority-ordered active lists, and a date-partitioned
//! CSV audit log with export and retention pruning.
//!
//! The engine is synchronous and poll-driven: an external device bridge
//! supplies a `{symbol -> value}` snapshot each cycle and the
//! [`AlarmManager`] does the rest. Protocol clients, symbol discovery
//! and UI rendering live outside this crate.
//!
//! # Examples
//!
//! ```rust
//! use sentra::{AlarmManager, EngineSettings, SymbolAlarmConfig, Value};
//! use std::collections::HashMap;
//!
//! let mut manager = AlarmManager::new(EngineSettings::default());
//!
//! let configs: Vec<SymbolAlarmConfig> = serde_yaml::from_str(r#"
//! - name: Main.Tank1.Level
//!   category: analog
//!   limits: { high: 80.0, high_high: 95.0 }
//!   priority: 1
//!   unit: "%"
//! "#).unwrap();
//!
//! let mut values = HashMap::new();
//! values.insert("Main.Tank1.Level".to_string(), Value::Float(83.0));
//! manager.check_alarms(&values, &configs);
//!
//! assert_eq!(manager.get_active_alarms(true).len(), 1);
//! ```

#![warn(missing_docs)]

/// Comprehensive error handling with structured error types
pub mod error;

/// Measurement value type supplied by the device bridge
pub mod value;

/// Engine settings and per-symbol alarm configuration
pub mod config;

/// Alarm entity, identity and lifecycle state machine
pub mod alarm;

/// Hysteresis threshold evaluation
pub mod threshold;

/// Alarm detection orchestration, acknowledgment and queries
pub mod manager;

/// Durable date-partitioned CSV alarm log
pub mod logger;

// ============================================================================
// PUBLIC RE-EXPORTS
// ============================================================================

pub use alarm::{Alarm, AlarmId, AlarmKey, AlarmKind, AlarmPriority, AlarmState};
pub use config::{AlarmEngineConfig, EngineSettings, LimitSet, SymbolAlarmConfig, SymbolCategory};
pub use error::{AlarmError, Result};
pub use logger::{AlarmLogger, CsvLogListener};
pub use manager::{AlarmCounts, AlarmListener, AlarmManager, Sounder};
pub use threshold::{Direction, Evaluation};
pub use value::Value;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for hosts that have not configured their own
/// subscriber. Safe to call more than once; later calls are no-ops.
pub fn init() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false));

    // Already-initialized is not an error for library callers
    let _ = subscriber.try_init();
}

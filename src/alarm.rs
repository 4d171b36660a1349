// src/alarm.rs - Alarm entity and lifecycle state machine
//
// One `Alarm` is one trigger episode: created on a limit crossing,
// mutated in place while open, logically immutable once cleared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Alarm kind, one per configurable limit plus the boolean case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmKind {
    /// Value at or above the critical upper limit
    HighHigh,
    /// Value at or above the upper limit
    High,
    /// Value at or below the lower limit
    Low,
    /// Value at or below the critical lower limit
    LowLow,
    /// Boolean alarm flag, no hysteresis
    Digital,
}

impl AlarmKind {
    /// Wire/log representation, matches the audit log `AlarmType` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmKind::HighHigh => "HighHigh",
            AlarmKind::High => "High",
            AlarmKind::Low => "Low",
            AlarmKind::LowLow => "LowLow",
            AlarmKind::Digital => "Digital",
        }
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alarm priority levels, 1 (most severe) through 4.
///
/// Derived `Ord` follows the numeric level, so `Critical < High` and
/// ascending sorts put the most severe alarms first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlarmPriority {
    /// Priority 1: immediate operator action required
    Critical = 1,
    /// Priority 2: prompt operator action required
    High = 2,
    /// Priority 3: operator action required
    Medium = 3,
    /// Priority 4: operator awareness required
    Low = 4,
}

impl AlarmPriority {
    /// Numeric level as logged in the audit log `Priority` column.
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Build from a configured numeric level. Out-of-range levels fall
    /// back to `High` (2), the default the discovery pipeline emits.
    pub fn from_level(level: u8) -> Self {
        match level {
            1 => AlarmPriority::Critical,
            2 => AlarmPriority::High,
            3 => AlarmPriority::Medium,
            4 => AlarmPriority::Low,
            _ => AlarmPriority::High,
        }
    }
}

/// Alarm lifecycle states.
///
/// `Active` is initial, `Cleared` is terminal. The only operator-driven
/// transition is `Active -> Acknowledged`; clearing is driven solely by
/// the threshold evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmState {
    /// Condition present, not yet acknowledged
    Active,
    /// Condition present, acknowledged by an operator
    Acknowledged,
    /// Condition gone; retained for history/audit only
    Cleared,
}

impl AlarmState {
    /// Log representation, matches the audit log `State` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmState::Active => "ACTIVE",
            AlarmState::Acknowledged => "ACKNOWLEDGED",
            AlarmState::Cleared => "CLEARED",
        }
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of at most one open alarm instance: `(symbol, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlarmKey {
    /// Monitored point identifier
    pub symbol: String,
    /// Which limit this alarm belongs to
    pub kind: AlarmKind,
}

impl AlarmKey {
    /// Build a key from a symbol name and alarm kind.
    pub fn new(symbol: impl Into<String>, kind: AlarmKind) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
        }
    }
}

impl fmt::Display for AlarmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.symbol, self.kind)
    }
}

/// Stable, collision-free alarm identity for one trigger episode.
///
/// The sequence number is assigned by the manager at trigger time, so two
/// episodes of the same key created within the same clock tick still get
/// distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlarmId {
    /// The alarm key this episode belongs to
    pub key: AlarmKey,
    /// Process-wide monotonic sequence number
    pub seq: u64,
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.key, self.seq)
    }
}

/// One triggered alarm condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    /// Unique episode identity
    pub id: AlarmId,
    /// Monitored point identifier
    pub symbol_name: String,
    /// Which limit was crossed
    pub kind: AlarmKind,
    /// Severity ranking
    pub priority: AlarmPriority,
    /// Last observed measurement; refreshed while the alarm is open
    pub value: f64,
    /// The threshold that was crossed, fixed at trigger time
    pub limit: f64,
    /// Human-readable description, fixed at trigger time
    pub message: String,
    /// Lifecycle state
    pub state: AlarmState,
    /// Trigger time
    pub triggered_at: DateTime<Utc>,
    /// Acknowledgment time, if acknowledged
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Operator who acknowledged, if acknowledged
    pub acknowledged_by: Option<String>,
    /// Clear time, once cleared
    pub cleared_at: Option<DateTime<Utc>>,
}

impl Alarm {
    /// Create a new alarm in `Active` state.
    pub fn new(
        id: AlarmId,
        priority: AlarmPriority,
        value: f64,
        limit: f64,
        message: impl Into<String>,
    ) -> Self {
        let symbol_name = id.key.symbol.clone();
        let kind = id.key.kind;
        Self {
            id,
            symbol_name,
            kind,
            priority,
            value,
            limit,
            message: message.into(),
            state: AlarmState::Active,
            triggered_at: Utc::now(),
            acknowledged_at: None,
            acknowledged_by: None,
            cleared_at: None,
        }
    }

    /// The `(symbol, kind)` key identifying this alarm's open slot.
    pub fn key(&self) -> &AlarmKey {
        &self.id.key
    }

    /// Acknowledge the alarm. Only `Active` alarms transition; anything
    /// else is a no-op and returns `false` (idempotent acknowledgment).
    pub fn acknowledge(&mut self, user: &str) -> bool {
        if self.state != AlarmState::Active {
            return false;
        }
        self.state = AlarmState::Acknowledged;
        self.acknowledged_at = Some(Utc::now());
        self.acknowledged_by = Some(user.to_string());
        info!("Alarm acknowledged by {}: {}", user, self.message);
        true
    }

    /// Clear the alarm. Irreversible; no-op if already cleared.
    pub fn clear(&mut self) {
        if self.state == AlarmState::Cleared {
            return;
        }
        self.state = AlarmState::Cleared;
        self.cleared_at = Some(Utc::now());
        info!("Alarm cleared: {}", self.message);
    }

    /// True while the alarm occupies its active slot (Active or
    /// Acknowledged).
    pub fn is_open(&self) -> bool {
        matches!(self.state, AlarmState::Active | AlarmState::Acknowledged)
    }
}

// src/manager.rs - Alarm detection orchestration and lifecycle management
//
// The manager exclusively owns the active map and the history; hosts
// observe both only through snapshot queries. A multi-threaded host must
// serialize access to one manager instance behind its own lock.

use crate::alarm::{Alarm, AlarmId, AlarmKey, AlarmKind, AlarmPriority, AlarmState};
use crate::config::{EngineSettings, SymbolAlarmConfig, SymbolCategory};
use crate::error::Result;
use crate::threshold::{self, Direction, Evaluation};
use crate::value::Value;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Callback invoked after every batch of alarm state changes with the
/// priority-sorted active list.
///
/// A failing listener is logged and skipped; it cannot suppress the
/// remaining listeners or corrupt manager state.
pub trait AlarmListener {
    /// Called once per qualifying transition batch.
    fn on_alarms_changed(&mut self, active: &[Alarm]) -> Result<()>;
}

/// Audible notification seam. Hosts plug in a platform beeper or leave it
/// unset.
pub trait Sounder {
    /// Sound the annunciator for a newly triggered alarm.
    fn sound(&self, priority: AlarmPriority);
}

/// Aggregate alarm counts for dashboard summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlarmCounts {
    /// Open alarms still unacknowledged
    pub active: usize,
    /// Open alarms already acknowledged
    pub acknowledged: usize,
    /// Open alarms at priority 1
    pub critical: usize,
    /// Open alarms at priority 2
    pub high: usize,
    /// Open alarms at priority 3
    pub medium: usize,
    /// Open alarms at priority 4
    pub low: usize,
}

/// Owner of all alarm state: active instances, history, listeners.
pub struct AlarmManager {
    settings: EngineSettings,
    /// Alarm key -> index into `history` for the open episode
    active: HashMap<AlarmKey, usize>,
    /// Every alarm ever created, in trigger order
    history: Vec<Alarm>,
    listeners: Vec<Box<dyn AlarmListener>>,
    sounder: Option<Box<dyn Sounder>>,
    next_seq: u64,
}

impl AlarmManager {
    /// Create a manager with the given settings and no listeners.
    pub fn new(settings: EngineSettings) -> Self {
        info!("AlarmManager initialized (enabled={})", settings.enabled);
        Self {
            settings,
            active: HashMap::new(),
            history: Vec::new(),
            listeners: Vec::new(),
            sounder: None,
            next_seq: 0,
        }
    }

    /// Current engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Register a listener, invoked in registration order after every
    /// batch of state changes.
    pub fn register_listener(&mut self, listener: Box<dyn AlarmListener>) {
        self.listeners.push(listener);
    }

    /// Install the audible notifier.
    pub fn set_sounder(&mut self, sounder: Box<dyn Sounder>) {
        self.sounder = Some(sounder);
    }

    /// Enable or disable the audible notifier at runtime.
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
        info!("Alarm sound {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Enable or disable alarm evaluation at runtime.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
        info!("Alarm evaluation {}", if enabled { "enabled" } else { "disabled" });
    }

    // ========================================================================
    // DETECTION
    // ========================================================================

    /// Evaluate one measurement snapshot against the configured symbols.
    ///
    /// Each configured limit is checked independently; a symbol absent
    /// from `values` is skipped as stale, and a measurement whose type
    /// does not fit the symbol category skips only that symbol.
    /// Listeners are notified once if any state changed this cycle.
    pub fn check_alarms(&mut self, values: &HashMap<String, Value>, configs: &[SymbolAlarmConfig]) {
        if !self.settings.enabled {
            return;
        }

        let mut changed = false;

        for config in configs {
            let Some(value) = values.get(&config.name) else {
                // No new data for this symbol this cycle
                continue;
            };
            if !config.enabled {
                continue;
            }

            match config.category {
                SymbolCategory::Analog => {
                    let Some(current) = value.as_float() else {
                        warn!(
                            "Symbol '{}' is configured analog but carries {}",
                            config.name,
                            value.type_name()
                        );
                        continue;
                    };
                    changed |= self.check_analog(config, current);
                }
                SymbolCategory::Digital => {
                    let Some(flag) = value.as_bool() else {
                        continue;
                    };
                    changed |= self.check_digital(config, flag);
                }
            }
        }

        if changed {
            self.notify_listeners();
        }
    }

    /// Evaluate every configured limit of an analog symbol. Returns true
    /// if any alarm was created or cleared.
    fn check_analog(&mut self, config: &SymbolAlarmConfig, value: f64) -> bool {
        if config.limits.is_empty() {
            return false;
        }
        let mut changed = false;
        for (kind, limit, direction) in config.limits.entries() {
            let key = AlarmKey::new(&config.name, kind);
            let evaluation =
                threshold::evaluate(value, limit, self.settings.hysteresis_percent, direction);

            match (evaluation, self.active.get(&key).copied()) {
                (Evaluation::Trigger, None) => {
                    let op = match direction {
                        Direction::RisingBound => ">=",
                        Direction::FallingBound => "<=",
                    };
                    let message = format!(
                        "{}: {:.2}{} {} {}{} ({})",
                        config.name, value, config.unit, op, limit, config.unit, kind
                    );
                    self.raise_alarm(key, config.alarm_priority(), value, limit, message);
                    changed = true;
                }
                (Evaluation::Clear, Some(idx)) => {
                    self.clear_alarm(&key, idx);
                    changed = true;
                }
                // Value refresh while open: in-place, identity unchanged,
                // no listener notification.
                (Evaluation::Trigger | Evaluation::Hold, Some(idx)) => {
                    self.history[idx].value = value;
                }
                _ => {}
            }
        }
        changed
    }

    /// Evaluate a digital symbol: active exactly while the flag is true.
    fn check_digital(&mut self, config: &SymbolAlarmConfig, flag: bool) -> bool {
        let key = AlarmKey::new(&config.name, AlarmKind::Digital);

        match (threshold::evaluate_digital(flag), self.active.get(&key).copied()) {
            (Evaluation::Trigger, None) => {
                let message = config
                    .alarm_text
                    .clone()
                    .unwrap_or_else(|| format!("{} Alarm", config.name));
                self.raise_alarm(key, config.alarm_priority(), 1.0, 1.0, message);
                true
            }
            (Evaluation::Clear, Some(idx)) => {
                self.clear_alarm(&key, idx);
                true
            }
            _ => false,
        }
    }

    fn raise_alarm(
        &mut self,
        key: AlarmKey,
        priority: AlarmPriority,
        value: f64,
        limit: f64,
        message: String,
    ) {
        self.next_seq += 1;
        let id = AlarmId {
            key: key.clone(),
            seq: self.next_seq,
        };
        let mut alarm = Alarm::new(id, priority, value, limit, message);
        warn!("NEW ALARM: {}", alarm.message);

        if self.settings.auto_acknowledge {
            alarm.acknowledge("System");
        }
        if self.settings.sound_enabled {
            if let Some(sounder) = &self.sounder {
                sounder.sound(priority);
            }
        }

        self.history.push(alarm);
        self.active.insert(key, self.history.len() - 1);
    }

    fn clear_alarm(&mut self, key: &AlarmKey, idx: usize) {
        self.history[idx].clear();
        self.active.remove(key);
    }

    // ========================================================================
    // ACKNOWLEDGMENT
    // ========================================================================

    /// Acknowledge one alarm by id. Returns true if a transition
    /// happened; an unknown id or a non-Active alarm is a no-op.
    pub fn acknowledge(&mut self, alarm_id: &AlarmId, user: &str) -> bool {
        let Some(&idx) = self.active.get(&alarm_id.key) else {
            return false;
        };
        if self.history[idx].id != *alarm_id {
            // Open episode for this key is not the one being acknowledged
            return false;
        }
        if self.history[idx].acknowledge(user) {
            self.notify_listeners();
            true
        } else {
            false
        }
    }

    /// Acknowledge every currently Active alarm. Fires at most one
    /// aggregate listener notification regardless of how many alarms
    /// transitioned.
    pub fn acknowledge_all(&mut self, user: &str) -> usize {
        let mut count = 0;
        let indices: Vec<usize> = self.active.values().copied().collect();
        for idx in indices {
            if self.history[idx].acknowledge(user) {
                count += 1;
            }
        }
        if count > 0 {
            info!("Acknowledged {} alarms", count);
            self.notify_listeners();
        }
        count
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Snapshot of all open alarms.
    ///
    /// With `sort_by_priority` the most severe come first, ties broken by
    /// oldest trigger time; otherwise newest-triggered first.
    pub fn get_active_alarms(&self, sort_by_priority: bool) -> Vec<Alarm> {
        let mut alarms: Vec<Alarm> = self
            .active
            .values()
            .map(|&idx| self.history[idx].clone())
            .collect();

        if sort_by_priority {
            alarms.sort_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then(a.triggered_at.cmp(&b.triggered_at))
            });
        } else {
            alarms.sort_by(|a, b| b.triggered_at.cmp(&a.triggered_at));
        }
        alarms
    }

    /// Snapshot of open alarms still awaiting acknowledgment.
    pub fn get_unacknowledged_alarms(&self) -> Vec<Alarm> {
        self.active
            .values()
            .map(|&idx| &self.history[idx])
            .filter(|a| a.state == AlarmState::Active)
            .cloned()
            .collect()
    }

    /// Aggregate counts of open alarms by state and priority.
    pub fn get_alarm_count(&self) -> AlarmCounts {
        let mut counts = AlarmCounts::default();
        for &idx in self.active.values() {
            let alarm = &self.history[idx];
            match alarm.state {
                AlarmState::Active => counts.active += 1,
                AlarmState::Acknowledged => counts.acknowledged += 1,
                AlarmState::Cleared => {}
            }
            match alarm.priority {
                AlarmPriority::Critical => counts.critical += 1,
                AlarmPriority::High => counts.high += 1,
                AlarmPriority::Medium => counts.medium += 1,
                AlarmPriority::Low => counts.low += 1,
            }
        }
        counts
    }

    /// The most recent `limit` history entries, newest first.
    pub fn get_alarm_history(&self, limit: usize) -> Vec<Alarm> {
        self.history.iter().rev().take(limit).cloned().collect()
    }

    /// Drop every Cleared entry from the in-memory history, keeping the
    /// still-open ones. The durable log is unaffected.
    pub fn clear_alarm_history(&mut self) {
        self.history.retain(|a| a.is_open());
        // Indices into history shifted; rebuild the active map
        self.active = self
            .history
            .iter()
            .enumerate()
            .map(|(idx, a)| (a.key().clone(), idx))
            .collect();
        info!("Alarm history cleared");
    }

    // ========================================================================
    // LISTENER DISPATCH
    // ========================================================================

    /// Invoke every listener with the current priority-sorted active
    /// list. Listener failures are isolated: logged and skipped.
    fn notify_listeners(&mut self) {
        let snapshot = self.get_active_alarms(true);
        for listener in &mut self.listeners {
            if let Err(e) = listener.on_alarms_changed(&snapshot) {
                error!("Error in alarm listener: {}", e);
            }
        }
    }
}

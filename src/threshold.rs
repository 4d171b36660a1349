// src/threshold.rs - Hysteresis threshold evaluation
//
// Pure functions; all alarm state lives in the manager. The hysteresis
// band keeps a noisy signal sitting at the limit from chattering between
// trigger and clear on every poll.

/// Which side of the limit arms the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// High/HighHigh limits: trigger when the value rises to the limit
    RisingBound,
    /// Low/LowLow limits: trigger when the value falls to the limit
    FallingBound,
}

/// Outcome of evaluating one value against one limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Condition present; open an alarm if none exists for this key
    Trigger,
    /// Inside the hysteresis band; keep whatever state exists
    Hold,
    /// Condition gone past the band; clear an open alarm
    Clear,
}

/// Evaluate an analog value against a limit with a hysteresis band.
///
/// The band is `|limit| * hysteresis_percent / 100`. For a rising bound
/// the alarm triggers at `value >= limit` and clears only once the value
/// drops below `limit - band`; falling bounds mirror this above the
/// limit. Everything in between is `Hold`.
///
/// # Examples
///
/// ```rust
/// use sentra::threshold::{evaluate, Direction, Evaluation};
///
/// // limit 80, 2% band = 1.6
/// assert_eq!(evaluate(81.0, 80.0, 2.0, Direction::RisingBound), Evaluation::Trigger);
/// assert_eq!(evaluate(79.0, 80.0, 2.0, Direction::RisingBound), Evaluation::Hold);
/// assert_eq!(evaluate(78.0, 80.0, 2.0, Direction::RisingBound), Evaluation::Clear);
/// ```
pub fn evaluate(
    value: f64,
    limit: f64,
    hysteresis_percent: f64,
    direction: Direction,
) -> Evaluation {
    let band = (limit * hysteresis_percent / 100.0).abs();
    match direction {
        Direction::RisingBound => {
            if value >= limit {
                Evaluation::Trigger
            } else if value < limit - band {
                Evaluation::Clear
            } else {
                Evaluation::Hold
            }
        }
        Direction::FallingBound => {
            if value <= limit {
                Evaluation::Trigger
            } else if value > limit + band {
                Evaluation::Clear
            } else {
                Evaluation::Hold
            }
        }
    }
}

/// Degenerate evaluator for digital alarms: active exactly while the
/// flag is true, no hysteresis.
pub fn evaluate_digital(value: bool) -> Evaluation {
    if value {
        Evaluation::Trigger
    } else {
        Evaluation::Clear
    }
}

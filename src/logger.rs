// src/logger.rs - Durable, date-partitioned CSV alarm log
//
// One file per calendar date, header written on creation, rows appended
// in event order. Write failures are reported and never roll back the
// in-memory transition that produced them.

use crate::alarm::{Alarm, AlarmId};
use crate::error::Result;
use crate::manager::AlarmListener;
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Fixed column order of every log file.
pub const CSV_HEADERS: [&str; 9] = [
    "Timestamp",
    "Symbol",
    "Value",
    "AlarmType",
    "Priority",
    "State",
    "Message",
    "AcknowledgedBy",
    "AcknowledgedTime",
];

const FILE_PREFIX: &str = "alarm_log_";
const FILE_SUFFIX: &str = ".csv";

/// One row read back from a log file. All columns come back as the
/// strings that were written; audit tooling decides how to interpret
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct LogRecord {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "AlarmType")]
    pub alarm_type: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "AcknowledgedBy")]
    pub acknowledged_by: String,
    #[serde(rename = "AcknowledgedTime")]
    pub acknowledged_time: String,
}

/// Append-only alarm audit log with daily rotation.
pub struct AlarmLogger {
    directory: PathBuf,
}

impl AlarmLogger {
    /// Create a logger writing under `directory`, creating it if needed.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        info!("AlarmLogger initialized (directory={})", directory.display());
        Ok(Self { directory })
    }

    /// The log directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", FILE_PREFIX, date.format("%Y-%m-%d"), FILE_SUFFIX))
    }

    fn date_from_filename(path: &Path) -> Option<NaiveDate> {
        let stem = path.file_stem()?.to_str()?;
        let date_str = stem.strip_prefix(FILE_PREFIX)?;
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
    }

    /// Append one row for `alarm` to today's file, writing the header
    /// first if the file does not yet exist.
    pub fn log(&self, alarm: &Alarm) -> Result<()> {
        let path = self.file_for(Local::now().date_naive());
        let write_header = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(CSV_HEADERS)?;
        }
        writer.write_record(Self::row(alarm))?;
        writer.flush()?;

        debug!("Logged alarm: {}", alarm.message);
        Ok(())
    }

    /// Record an acknowledgment or clear as an additional row.
    pub fn log_state_change(&self, alarm: &Alarm) -> Result<()> {
        self.log(alarm)
    }

    fn row(alarm: &Alarm) -> [String; 9] {
        [
            alarm.triggered_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            alarm.symbol_name.clone(),
            format!("{:.2}", alarm.value),
            alarm.kind.as_str().to_string(),
            alarm.priority.level().to_string(),
            alarm.state.as_str().to_string(),
            alarm.message.clone(),
            alarm.acknowledged_by.clone().unwrap_or_default(),
            alarm
                .acknowledged_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        ]
    }

    /// Read up to `limit` rows for a given date, oldest-appended first.
    /// A date with no log file yields an empty list; quiet days are a
    /// normal outcome for audit tooling, not an error.
    pub fn read(&self, date: NaiveDate, limit: usize) -> Result<Vec<LogRecord>> {
        let path = self.file_for(date);
        if !path.exists() {
            warn!("Log file not found: {}", path.display());
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut records = Vec::new();
        for record in reader.deserialize::<LogRecord>() {
            records.push(record?);
            if records.len() >= limit {
                break;
            }
        }
        info!("Read {} alarms from {}", records.len(), path.display());
        Ok(records)
    }

    /// All log files, newest-first by the date encoded in the filename.
    /// Files whose names do not carry a parsable date are ignored.
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<(NaiveDate, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if let Some(date) = Self::date_from_filename(&path) {
                files.push((date, path));
            }
        }
        files.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Concatenate the rows of every file whose encoded date falls in
    /// `[start_date, end_date]` (defaults: all available, through today)
    /// into one combined file with a single header. Returns the number of
    /// rows exported.
    pub fn export(
        &self,
        output: impl AsRef<Path>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<usize> {
        let end = end_date.unwrap_or_else(|| Local::now().date_naive());

        // Oldest first in the combined output
        let mut files: Vec<PathBuf> = self
            .list_files()?
            .into_iter()
            .filter(|path| match Self::date_from_filename(path) {
                Some(date) => start_date.map_or(true, |s| date >= s) && date <= end,
                None => false,
            })
            .collect();
        files.reverse();

        let mut writer = csv::Writer::from_path(output.as_ref())?;
        writer.write_record(CSV_HEADERS)?;

        let mut exported = 0;
        for path in files {
            let mut reader = csv::Reader::from_path(&path)?;
            for record in reader.records() {
                writer.write_record(&record?)?;
                exported += 1;
            }
        }
        writer.flush()?;

        info!("Exported {} alarms to {}", exported, output.as_ref().display());
        Ok(exported)
    }

    /// Delete files whose encoded date is older than
    /// `today - days_to_keep`. Returns the number of files deleted.
    pub fn cleanup(&self, days_to_keep: u32) -> Result<usize> {
        let cutoff = Local::now().date_naive() - Duration::days(days_to_keep as i64);
        let mut deleted = 0;
        for path in self.list_files()? {
            if let Some(date) = Self::date_from_filename(&path) {
                if date < cutoff {
                    std::fs::remove_file(&path)?;
                    deleted += 1;
                }
            }
        }
        if deleted > 0 {
            info!("Deleted {} old log files", deleted);
        }
        Ok(deleted)
    }
}

/// Listener that persists each alarm episode to the durable log exactly
/// once.
///
/// The dedup set is keyed by the episode's unique id, so a sustained
/// alarm that stays in the active list across many poll cycles produces
/// one row, while a new episode of the same symbol/kind produces a fresh
/// one. A failed write is reported and retried on the next notification;
/// it never blocks the in-memory transition or the other rows.
pub struct CsvLogListener {
    logger: AlarmLogger,
    logged: HashSet<AlarmId>,
}

impl CsvLogListener {
    /// Wrap a logger with a fresh dedup set.
    pub fn new(logger: AlarmLogger) -> Self {
        Self {
            logger,
            logged: HashSet::new(),
        }
    }
}

impl AlarmListener for CsvLogListener {
    fn on_alarms_changed(&mut self, active: &[Alarm]) -> Result<()> {
        for alarm in active {
            if self.logged.contains(&alarm.id) {
                continue;
            }
            match self.logger.log(alarm) {
                Ok(()) => {
                    self.logged.insert(alarm.id.clone());
                }
                Err(e) => {
                    // Retry on the next batch; keep going with the rest
                    error!("Failed to log alarm: {}", e);
                }
            }
        }

        // Episodes gone from the active list are cleared and can never
        // reappear under the same id; drop them to bound the set.
        let open: HashSet<&AlarmId> = active.iter().map(|a| &a.id).collect();
        self.logged.retain(|id| open.contains(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AlarmKey, AlarmKind, AlarmPriority};
    use tempfile::TempDir;

    fn test_alarm(seq: u64) -> Alarm {
        let id = AlarmId {
            key: AlarmKey::new("Main.Tank1.Level", AlarmKind::High),
            seq,
        };
        Alarm::new(id, AlarmPriority::High, 85.125, 80.0, "Tank1 level high")
    }

    #[test]
    fn test_log_creates_file_with_header() {
        let dir = TempDir::new().unwrap();
        let logger = AlarmLogger::new(dir.path()).unwrap();
        logger.log(&test_alarm(1)).unwrap();

        let files = logger.list_files().unwrap();
        assert_eq!(files.len(), 1);

        let contents = std::fs::read_to_string(&files[0]).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Timestamp,Symbol,Value,AlarmType,Priority,State,Message,AcknowledgedBy,AcknowledgedTime"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("Main.Tank1.Level"));
        // Fixed 2-decimal value precision
        assert!(row.contains(",85.13,"));
        assert!(row.contains(",ACTIVE,"));
    }

    #[test]
    fn test_header_written_once() {
        let dir = TempDir::new().unwrap();
        let logger = AlarmLogger::new(dir.path()).unwrap();
        logger.log(&test_alarm(1)).unwrap();
        logger.log(&test_alarm(2)).unwrap();

        let today = Local::now().date_naive();
        let records = logger.read(today, 100).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "Main.Tank1.Level");
        assert_eq!(records[0].state, "ACTIVE");
        assert_eq!(records[0].priority, "2");
    }

    #[test]
    fn test_read_respects_limit() {
        let dir = TempDir::new().unwrap();
        let logger = AlarmLogger::new(dir.path()).unwrap();
        for seq in 1..=5 {
            logger.log(&test_alarm(seq)).unwrap();
        }
        let records = logger.read(Local::now().date_naive(), 3).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_read_missing_date() {
        let dir = TempDir::new().unwrap();
        let logger = AlarmLogger::new(dir.path()).unwrap();
        let records = logger
            .read(NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(), 10)
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_state_change_rows() {
        let dir = TempDir::new().unwrap();
        let logger = AlarmLogger::new(dir.path()).unwrap();

        let mut alarm = test_alarm(1);
        logger.log(&alarm).unwrap();
        alarm.acknowledge("op1");
        logger.log_state_change(&alarm).unwrap();

        let records = logger.read(Local::now().date_naive(), 10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].state, "ACKNOWLEDGED");
        assert_eq!(records[1].acknowledged_by, "op1");
        assert!(!records[1].acknowledged_time.is_empty());
    }

    #[test]
    fn test_list_files_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        let logger = AlarmLogger::new(dir.path()).unwrap();
        for name in [
            "alarm_log_2026-08-01.csv",
            "alarm_log_2026-08-15.csv",
            "alarm_log_2026-07-20.csv",
            "unrelated.txt",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let files = logger.list_files().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "alarm_log_2026-08-15.csv",
                "alarm_log_2026-08-01.csv",
                "alarm_log_2026-07-20.csv"
            ]
        );
    }

    #[test]
    fn test_export_combines_partitions() {
        let dir = TempDir::new().unwrap();
        let logger = AlarmLogger::new(dir.path()).unwrap();

        let header = CSV_HEADERS.join(",");
        std::fs::write(
            dir.path().join("alarm_log_2026-08-01.csv"),
            format!("{}\n2026-08-01 10:00:00.000,a,1.00,High,2,ACTIVE,a high,,\n", header),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("alarm_log_2026-08-02.csv"),
            format!("{}\n2026-08-02 10:00:00.000,b,2.00,Low,3,ACTIVE,b low,,\n", header),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("alarm_log_2026-07-01.csv"),
            format!("{}\n2026-07-01 10:00:00.000,c,3.00,High,2,ACTIVE,c high,,\n", header),
        )
        .unwrap();

        let output = dir.path().join("export.csv");
        let exported = logger
            .export(
                &output,
                Some(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()),
                Some(NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()),
            )
            .unwrap();
        assert_eq!(exported, 2);

        let contents = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        // Single header, oldest partition first
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], header);
        assert!(lines[1].contains(",a,"));
        assert!(lines[2].contains(",b,"));
    }

    #[test]
    fn test_cleanup_deletes_old_partitions() {
        let dir = TempDir::new().unwrap();
        let logger = AlarmLogger::new(dir.path()).unwrap();

        let today = Local::now().date_naive();
        let old = today - Duration::days(60);
        let recent = today - Duration::days(5);
        for date in [old, recent] {
            std::fs::write(
                dir.path().join(format!("alarm_log_{}.csv", date.format("%Y-%m-%d"))),
                "",
            )
            .unwrap();
        }

        let deleted = logger.cleanup(30).unwrap();
        assert_eq!(deleted, 1);
        let files = logger.list_files().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0]
            .to_string_lossy()
            .contains(&recent.format("%Y-%m-%d").to_string()));
    }

    #[test]
    fn test_listener_logs_once_per_episode() {
        let dir = TempDir::new().unwrap();
        let logger = AlarmLogger::new(dir.path()).unwrap();
        let mut listener = CsvLogListener::new(logger);

        let alarm = test_alarm(1);
        let active = vec![alarm.clone()];

        // Same episode delivered on several consecutive poll cycles
        for _ in 0..4 {
            listener.on_alarms_changed(&active).unwrap();
        }
        // Episode cleared, then a new episode of the same key triggers
        listener.on_alarms_changed(&[]).unwrap();
        let second = test_alarm(2);
        listener.on_alarms_changed(&[second]).unwrap();

        let reader = AlarmLogger::new(dir.path()).unwrap();
        let records = reader.read(Local::now().date_naive(), 100).unwrap();
        assert_eq!(records.len(), 2);
    }
}

// ==========================================
// 晚宴分桌系统 - 结果导出
// ==========================================
// 输出: grid.csv / guests.csv / outcome.json / audit.json
// 约束: grid.csv、guests.csv 与导入列名一致，可直接再次导入
// ==========================================

use crate::domain::assignment::SeatingOutcome;
use crate::domain::attendee::GuestRecord;
use crate::domain::house::{GridRow, GUEST_SLOTS};
use crate::domain::types::format_seated_flag;
use crate::engine::audit::AuditReport;
use crate::importer::error::{ImportError, ImportResult};
use csv::Writer;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

pub const GRID_FILE: &str = "grid.csv";
pub const GUESTS_FILE: &str = "guests.csv";
pub const OUTCOME_FILE: &str = "outcome.json";
pub const AUDIT_FILE: &str = "audit.json";

pub struct OutcomeExporter {
    out_dir: PathBuf,
}

impl OutcomeExporter {
    pub fn new<P: AsRef<Path>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    fn prepare(&self) -> ImportResult<()> {
        fs::create_dir_all(&self.out_dir)
            .map_err(|e| ImportError::FileWriteError(format!("{}: {}", self.out_dir.display(), e)))
    }

    /// 导出一次运行的全部产物（座位表、客人、outcome.json）
    pub fn export_outcome(&self, outcome: &SeatingOutcome) -> ImportResult<Vec<PathBuf>> {
        self.prepare()?;
        let written = vec![
            self.write_grid(&outcome.grid_rows())?,
            self.write_guests(&outcome.guests)?,
            self.write_json(OUTCOME_FILE, outcome)?,
        ];
        info!(run_id = %outcome.run_id, dir = %self.out_dir.display(), "分配结果已导出");
        Ok(written)
    }

    pub fn export_audit(&self, report: &AuditReport) -> ImportResult<PathBuf> {
        self.prepare()?;
        self.write_json(AUDIT_FILE, report)
    }

    pub fn write_grid(&self, rows: &[GridRow]) -> ImportResult<PathBuf> {
        let path = self.out_dir.join(GRID_FILE);
        let mut writer = Writer::from_writer(File::create(&path)?);

        let mut header = vec![
            "House".to_string(),
            "Seats".to_string(),
            "Seated".to_string(),
            "Host".to_string(),
        ];
        header.extend((1..=GUEST_SLOTS).map(|slot| format!("Guest {}", slot)));
        writer.write_record(&header)?;

        for row in rows {
            let mut record = vec![
                opt_to_string(row.house_id),
                opt_to_string(row.capacity),
                opt_to_string(row.occupied_seats),
                row.host.clone().unwrap_or_default(),
            ];
            record.extend(
                (0..GUEST_SLOTS).map(|slot| row.guests.get(slot).cloned().flatten().unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_guests(&self, guests: &[GuestRecord]) -> ImportResult<PathBuf> {
        let path = self.out_dir.join(GUESTS_FILE);
        let mut writer = Writer::from_writer(File::create(&path)?);
        writer.write_record(["Code", "Count", "Seated", "Order"])?;
        for guest in guests {
            writer.write_record([
                guest.code.clone(),
                guest.party_size.to_string(),
                format_seated_flag(guest.seated).to_string(),
                opt_to_string(guest.order),
            ])?;
        }
        writer.flush()?;
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> ImportResult<PathBuf> {
        let path = self.out_dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))?;
        Ok(path)
    }
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

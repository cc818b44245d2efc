// ==========================================
// 晚宴分桌系统 - 名单与台账导入
// ==========================================
// 名单来源:
// - CSV 目录: hosts.csv / guests.csv / grid.csv / never_match.csv
// - Excel 工作簿: Hosts / Guests / Grid / NeverMatch
// 约束: hosts、guests 必须存在；grid、never_match 缺失视为空
// ==========================================

use crate::domain::pair::ConnectionEntry;
use crate::domain::roster::Roster;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{FieldMapper, CODE, SEATS};
use crate::importer::file_parser::{CsvParser, ExcelParser, RawRow};
use std::path::Path;
use tracing::{info, instrument};

/// 名单中的四张表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Hosts,
    Guests,
    Grid,
    NeverMatch,
}

impl Table {
    fn csv_name(&self) -> &'static str {
        match self {
            Table::Hosts => "hosts.csv",
            Table::Guests => "guests.csv",
            Table::Grid => "grid.csv",
            Table::NeverMatch => "never_match.csv",
        }
    }

    fn sheet_name(&self) -> &'static str {
        match self {
            Table::Hosts => "Hosts",
            Table::Guests => "Guests",
            Table::Grid => "Grid",
            Table::NeverMatch => "NeverMatch",
        }
    }

    fn required(&self) -> bool {
        matches!(self, Table::Hosts | Table::Guests)
    }
}

// ==========================================
// RosterImporter
// ==========================================
pub struct RosterImporter {
    mapper: FieldMapper,
}

impl RosterImporter {
    pub fn new() -> Self {
        Self { mapper: FieldMapper }
    }

    /// 导入名单（CSV 目录或 .xlsx/.xls 工作簿）
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn import<P: AsRef<Path>>(&self, path: P) -> ImportResult<Roster> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let tables = if path.is_dir() {
            self.read_csv_dir(path)?
        } else {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            match ext.as_str() {
                "xlsx" | "xls" => self.read_workbook(path)?,
                _ => return Err(ImportError::UnsupportedFormat(path.display().to_string())),
            }
        };

        let roster = self.map_tables(tables)?;
        info!(
            hosts = roster.hosts.len(),
            guests = roster.guests.len(),
            grid_rows = roster.grid.len(),
            never_match = roster.never_match.len(),
            "名单导入完成"
        );
        Ok(roster)
    }

    fn read_csv_dir(&self, dir: &Path) -> ImportResult<TableRows> {
        let mut tables = TableRows::default();
        for table in [Table::Hosts, Table::Guests, Table::Grid, Table::NeverMatch] {
            let file = dir.join(table.csv_name());
            if !file.exists() {
                if table.required() {
                    return Err(ImportError::FileNotFound(file.display().to_string()));
                }
                continue;
            }
            tables.set(table, CsvParser.parse_file(&file)?);
        }
        Ok(tables)
    }

    fn read_workbook(&self, path: &Path) -> ImportResult<TableRows> {
        let mut parser = ExcelParser::open(path)?;
        let mut tables = TableRows::default();
        for table in [Table::Hosts, Table::Guests, Table::Grid, Table::NeverMatch] {
            match parser.sheet_rows(table.sheet_name())? {
                Some(rows) => tables.set(table, rows),
                None if table.required() => {
                    return Err(ImportError::SheetMissing(table.sheet_name().to_string()))
                }
                None => {}
            }
        }
        Ok(tables)
    }

    fn map_tables(&self, tables: TableRows) -> ImportResult<Roster> {
        check_columns(&tables.hosts, Table::Hosts, &[("Code", CODE), ("Seats", SEATS)])?;
        check_columns(&tables.guests, Table::Guests, &[("Code", CODE)])?;

        let hosts = tables
            .hosts
            .iter()
            .map(|row| self.mapper.map_host(row))
            .collect::<ImportResult<Vec<_>>>()?;
        let guests = tables
            .guests
            .iter()
            .map(|row| self.mapper.map_guest(row))
            .collect::<ImportResult<Vec<_>>>()?;
        let grid = tables
            .grid
            .iter()
            .map(|row| self.mapper.map_grid_row(row))
            .collect::<ImportResult<Vec<_>>>()?
            .into_iter()
            .filter(|row| !row.is_blank())
            .collect();
        let never_match = tables
            .never_match
            .iter()
            .filter_map(|row| self.mapper.map_never_match(row))
            .collect();

        Ok(Roster {
            hosts,
            guests,
            grid,
            never_match,
        })
    }

    /// 导入台账 CSV
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn import_connections<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<ConnectionEntry>> {
        let rows = CsvParser.parse_file(path.as_ref())?;
        let entries = rows
            .iter()
            .map(|row| self.mapper.map_connection(row))
            .collect::<ImportResult<Vec<_>>>()?;
        info!(rows = entries.len(), "台账导入完成");
        Ok(entries)
    }
}

impl Default for RosterImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct TableRows {
    hosts: Vec<RawRow>,
    guests: Vec<RawRow>,
    grid: Vec<RawRow>,
    never_match: Vec<RawRow>,
}

impl TableRows {
    fn set(&mut self, table: Table, rows: Vec<RawRow>) {
        match table {
            Table::Hosts => self.hosts = rows,
            Table::Guests => self.guests = rows,
            Table::Grid => self.grid = rows,
            Table::NeverMatch => self.never_match = rows,
        }
    }
}

/// 首行缺少必需列时报错（空表不检查）
fn check_columns(rows: &[RawRow], table: Table, columns: &[(&str, &[&str])]) -> ImportResult<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for (name, aliases) in columns {
        if !first.has_column(aliases) {
            return Err(ImportError::MissingColumn {
                table: table.sheet_name().to_string(),
                column: name.to_string(),
            });
        }
    }
    Ok(())
}

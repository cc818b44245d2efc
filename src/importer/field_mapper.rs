// ==========================================
// 晚宴分桌系统 - 字段映射器
// ==========================================
// 职责: 原始行 → 领域记录（列名别名 + 类型转换）
// 约束: 列名大小写不敏感（见 file_parser::normalize_header）
// ==========================================

use crate::domain::attendee::{GuestRecord, HostRecord};
use crate::domain::house::{GridRow, GUEST_SLOTS};
use crate::domain::pair::ConnectionEntry;
use crate::domain::types::parse_seated_flag;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;
use chrono::{Datelike, NaiveDate};

// ===== 列名别名 =====
pub const CODE: &[&str] = &["Code", "Member", "ID"];
pub const COUNT: &[&str] = &["Count", "Party Size", "Party", "Self Occupancy"];
pub const SEATS: &[&str] = &["Seats", "Capacity", "Seat Capacity"];
pub const ORDER: &[&str] = &["Order", "Sequence"];
pub const SEATED: &[&str] = &["Seated"];
pub const HOUSE: &[&str] = &["House", "House ID"];
pub const HOST: &[&str] = &["Host"];
pub const PAIR: &[&str] = &["Pair", "Pair Key", "Never Match"];
pub const MEMBER_1: &[&str] = &["Member 1", "Member1"];
pub const MEMBER_2: &[&str] = &["Member 2", "Member2"];
pub const YEAR: &[&str] = &["Year"];
pub const DATE: &[&str] = &["Date", "Dinner Date"];
pub const HOST_ROLE: &[&str] = &["Host Role", "Role"];
pub const MONTHS_APART: &[&str] = &["Months Apart", "Months"];

/// 账本与导入支持的日期格式
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%Y%m%d"];

pub struct FieldMapper;

impl FieldMapper {
    pub fn map_host(&self, row: &RawRow) -> ImportResult<HostRecord> {
        Ok(HostRecord {
            code: self.get_string(row, CODE).unwrap_or_default(),
            self_occupancy: self.parse_u32(row, COUNT, "Count")?.unwrap_or(1),
            seat_capacity: self
                .parse_u32(row, SEATS, "Seats")?
                .ok_or_else(|| ImportError::TypeConversionError {
                    row: row.row_number,
                    field: "Seats".to_string(),
                    message: "主人座位数为空".to_string(),
                })?,
            order: self.parse_i64(row, ORDER, "Order")?,
        })
    }

    pub fn map_guest(&self, row: &RawRow) -> ImportResult<GuestRecord> {
        let seated = match self.get_string(row, SEATED) {
            None => false,
            Some(raw) => parse_seated_flag(&raw).ok_or_else(|| ImportError::TypeConversionError {
                row: row.row_number,
                field: "Seated".to_string(),
                message: format!("无法解析为 Yes/No: {}", raw),
            })?,
        };
        Ok(GuestRecord {
            code: self.get_string(row, CODE).unwrap_or_default(),
            party_size: self.parse_u32(row, COUNT, "Count")?.unwrap_or(1),
            seated,
            order: self.parse_i64(row, ORDER, "Order")?,
        })
    }

    pub fn map_grid_row(&self, row: &RawRow) -> ImportResult<GridRow> {
        let guests = (1..=GUEST_SLOTS)
            .map(|slot| {
                let compact = format!("Guest{}", slot);
                let spaced = format!("Guest {}", slot);
                self.get_string(row, &[spaced.as_str(), compact.as_str()])
            })
            .collect();
        Ok(GridRow {
            house_id: self.parse_u32(row, HOUSE, "House")?,
            capacity: self.parse_u32(row, SEATS, "Seats")?,
            occupied_seats: self.parse_u32(row, SEATED, "Seated")?,
            host: self.get_string(row, HOST),
            guests,
        })
    }

    /// 永不同桌: "Pair" 列（A-B）或 Member 1 / Member 2 两列
    pub fn map_never_match(&self, row: &RawRow) -> Option<String> {
        if let Some(pair) = self.get_string(row, PAIR) {
            return Some(pair);
        }
        match (self.get_string(row, MEMBER_1), self.get_string(row, MEMBER_2)) {
            (Some(a), Some(b)) => Some(format!("{}-{}", a, b)),
            _ => None,
        }
    }

    /// 台账行: Pair, Member 1, Member 2, Year, Date, Host Role, Months Apart
    pub fn map_connection(&self, row: &RawRow) -> ImportResult<ConnectionEntry> {
        let member_1 = self.require(row, MEMBER_1, "Member 1")?;
        let member_2 = self.require(row, MEMBER_2, "Member 2")?;
        let (owner, partner) = match self.get_string(row, PAIR) {
            Some(pair) => match pair.split_once('-') {
                Some((a, b)) if !a.trim().is_empty() && !b.trim().is_empty() => {
                    (a.trim().to_string(), b.trim().to_string())
                }
                _ => {
                    return Err(ImportError::TypeConversionError {
                        row: row.row_number,
                        field: "Pair".to_string(),
                        message: format!("无法解析成员对: {}", pair),
                    })
                }
            },
            None => (member_1.clone(), member_2.clone()),
        };

        let dinner_date = self
            .parse_date(row, DATE, "Date")?
            .ok_or_else(|| ImportError::DateFormatError {
                row: row.row_number,
                field: "Date".to_string(),
                value: String::new(),
            })?;
        let year = self
            .parse_i64(row, YEAR, "Year")?
            .map(|y| y as i32)
            .unwrap_or_else(|| dinner_date.year());
        let host_role = self
            .get_string(row, HOST_ROLE)
            .map(|raw| matches!(raw.to_lowercase().as_str(), "host" | "yes" | "y" | "true" | "1"))
            .unwrap_or(false);

        Ok(ConnectionEntry {
            owner,
            partner,
            member_1,
            member_2,
            year,
            dinner_date,
            host_role,
            months_apart: self.parse_i64(row, MONTHS_APART, "Months Apart")?.unwrap_or(0),
        })
    }

    /// 提取字符串字段，支持多个可能的列名（别名）
    fn get_string(&self, row: &RawRow, aliases: &[&str]) -> Option<String> {
        row.get(aliases).map(|v| v.to_string())
    }

    fn require(&self, row: &RawRow, aliases: &[&str], field: &str) -> ImportResult<String> {
        self.get_string(row, aliases)
            .ok_or_else(|| ImportError::TypeConversionError {
                row: row.row_number,
                field: field.to_string(),
                message: "必填字段为空".to_string(),
            })
    }

    /// 解析非负整数（兼容 Excel 的 "4.0"）
    fn parse_u32(&self, row: &RawRow, aliases: &[&str], field: &str) -> ImportResult<Option<u32>> {
        match self.parse_i64(row, aliases, field)? {
            None => Ok(None),
            Some(v) => u32::try_from(v).map(Some).map_err(|_| ImportError::TypeConversionError {
                row: row.row_number,
                field: field.to_string(),
                message: format!("不能为负数: {}", v),
            }),
        }
    }

    fn parse_i64(&self, row: &RawRow, aliases: &[&str], field: &str) -> ImportResult<Option<i64>> {
        let Some(value) = self.get_string(row, aliases) else {
            return Ok(None);
        };
        if let Ok(v) = value.parse::<i64>() {
            return Ok(Some(v));
        }
        match value.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
            _ => Err(ImportError::TypeConversionError {
                row: row.row_number,
                field: field.to_string(),
                message: format!("无法解析为整数: {}", value),
            }),
        }
    }

    fn parse_date(&self, row: &RawRow, aliases: &[&str], field: &str) -> ImportResult<Option<NaiveDate>> {
        let Some(value) = self.get_string(row, aliases) else {
            return Ok(None);
        };
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&value, fmt).ok())
            .map(Some)
            .ok_or_else(|| ImportError::DateFormatError {
                row: row.row_number,
                field: field.to_string(),
                value,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        let mut row = RawRow::new(2);
        for (k, v) in pairs {
            row.insert(k, v);
        }
        row
    }

    #[test]
    fn test_map_host_with_aliases() {
        let host = FieldMapper
            .map_host(&row(&[("CODE", "H01"), ("party size", "2"), ("Capacity", "6.0")]))
            .unwrap();
        assert_eq!(host.code, "H01");
        assert_eq!(host.self_occupancy, 2);
        assert_eq!(host.seat_capacity, 6);
        assert_eq!(host.order, None);
    }

    #[test]
    fn test_map_host_requires_seats() {
        let result = FieldMapper.map_host(&row(&[("Code", "H01"), ("Count", "1")]));
        assert!(matches!(result, Err(ImportError::TypeConversionError { .. })));
    }

    #[test]
    fn test_map_guest_defaults() {
        let guest = FieldMapper.map_guest(&row(&[("Code", "G01")])).unwrap();
        assert_eq!(guest.party_size, 1);
        assert!(!guest.seated);

        let guest = FieldMapper
            .map_guest(&row(&[("Code", "G02"), ("Count", "2"), ("Seated", "No"), ("Order", "4")]))
            .unwrap();
        assert_eq!(guest.party_size, 2);
        assert_eq!(guest.order, Some(4));
    }

    #[test]
    fn test_map_guest_invalid_number() {
        let result = FieldMapper.map_guest(&row(&[("Code", "G01"), ("Count", "two")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_map_grid_row() {
        let grid = FieldMapper
            .map_grid_row(&row(&[
                ("House", "3"),
                ("Seats", "6"),
                ("Seated", "4"),
                ("Host", "H03"),
                ("Guest 1", "G01"),
                ("Guest3", "G02"),
            ]))
            .unwrap();
        assert_eq!(grid.house_id, Some(3));
        assert_eq!(grid.host.as_deref(), Some("H03"));
        assert_eq!(grid.guests.len(), GUEST_SLOTS);
        assert_eq!(grid.guest_codes().collect::<Vec<_>>(), vec!["G01", "G02"]);
    }

    #[test]
    fn test_map_never_match_forms() {
        assert_eq!(FieldMapper.map_never_match(&row(&[("Pair", "A-B")])), Some("A-B".to_string()));
        assert_eq!(
            FieldMapper.map_never_match(&row(&[("Member 1", "C"), ("Member 2", "D")])),
            Some("C-D".to_string())
        );
        assert_eq!(FieldMapper.map_never_match(&row(&[("Member 1", "C")])), None);
    }

    #[test]
    fn test_map_connection() {
        let entry = FieldMapper
            .map_connection(&row(&[
                ("Pair", "G01-H01"),
                ("Member 1", "H01"),
                ("Member 2", "G01"),
                ("Date", "3/8/2025"),
                ("Host Role", "Host"),
                ("Months Apart", "7"),
            ]))
            .unwrap();
        assert_eq!(entry.oriented_key(), "G01-H01");
        assert_eq!(entry.year, 2025);
        assert_eq!(entry.dinner_date, NaiveDate::from_ymd_opt(2025, 3, 8).unwrap());
        assert!(entry.host_role);
        assert_eq!(entry.months_apart, 7);
    }

    #[test]
    fn test_map_connection_bad_date() {
        let result = FieldMapper.map_connection(&row(&[
            ("Member 1", "A"),
            ("Member 2", "B"),
            ("Date", "March"),
        ]));
        assert!(matches!(result, Err(ImportError::DateFormatError { .. })));
    }
}

// ==========================================
// 晚宴分桌系统 - 表格文件解析器
// ==========================================
// 支持: CSV 文件 / Excel 工作簿（按工作表名读取）
// 输出: 以规范化表头为键的原始行（空白行跳过）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// 表头规范化: 去首尾空白、合并内部空白、转小写
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ==========================================
// RawRow - 一行原始数据
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 源文件行号（表头为第 1 行）
    pub row_number: usize,
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            fields: HashMap::new(),
        }
    }

    pub fn insert(&mut self, header: &str, value: &str) {
        self.fields.insert(normalize_header(header), value.trim().to_string());
    }

    /// 按别名顺序取第一个非空值
    pub fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .filter_map(|alias| self.fields.get(&normalize_header(alias)))
            .map(|v| v.as_str())
            .find(|v| !v.is_empty())
    }

    pub fn has_column(&self, aliases: &[&str]) -> bool {
        aliases
            .iter()
            .any(|alias| self.fields.contains_key(&normalize_header(alias)))
    }

    pub fn is_blank(&self) -> bool {
        self.fields.values().all(|v| v.is_empty())
    }
}

// ==========================================
// CSV Parser
// ==========================================
pub struct CsvParser;

impl CsvParser {
    pub fn parse_file(&self, path: &Path) -> ImportResult<Vec<RawRow>> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let file = File::open(path)?;
        self.parse_reader(file)
    }

    pub fn parse_reader<R: Read>(&self, reader: R) -> ImportResult<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut row = RawRow::new(idx + 2);
            for (header, value) in headers.iter().zip(record.iter()) {
                row.insert(header, value);
            }
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }
        Ok(rows)
    }
}

// ==========================================
// Excel Parser（按工作表读取）
// ==========================================
pub struct ExcelParser {
    workbook: Xlsx<BufReader<File>>,
}

impl ExcelParser {
    pub fn open(path: &Path) -> ImportResult<Self> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let workbook: Xlsx<_> = open_workbook(path)?;
        Ok(Self { workbook })
    }

    /// 读取工作表（名称大小写不敏感）
    ///
    /// # 返回
    /// - Ok(None): 工作簿中无此工作表
    pub fn sheet_rows(&mut self, sheet: &str) -> ImportResult<Option<Vec<RawRow>>> {
        let wanted = normalize_header(sheet);
        let name = self
            .workbook
            .sheet_names()
            .into_iter()
            .find(|n| normalize_header(n) == wanted);
        let Some(name) = name else {
            return Ok(None);
        };

        let range = self.workbook.worksheet_range(&name)?;
        let mut iter = range.rows();
        let headers: Vec<String> = match iter.next() {
            Some(header_row) => header_row.iter().map(|cell| cell.to_string()).collect(),
            None => return Ok(Some(Vec::new())),
        };

        let mut rows = Vec::new();
        for (idx, data_row) in iter.enumerate() {
            let mut row = RawRow::new(idx + 2);
            for (header, cell) in headers.iter().zip(data_row.iter()) {
                row.insert(header, &cell.to_string());
            }
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }
        Ok(Some(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Guest   1 "), "guest 1");
        assert_eq!(normalize_header("Party Size"), "party size");
    }

    #[test]
    fn test_csv_parser_skips_blank_rows() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Code, Count ,Seated").unwrap();
        writeln!(temp_file, "G01,2,Yes").unwrap();
        writeln!(temp_file, ",,").unwrap();
        writeln!(temp_file, "G02,1").unwrap();

        let rows = CsvParser.parse_file(temp_file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(&["code"]), Some("G01"));
        assert_eq!(rows[0].get(&["COUNT"]), Some("2"));
        assert_eq!(rows[1].row_number, 4);
        assert_eq!(rows[1].get(&["Seated"]), None);
        assert!(!rows[1].has_column(&["Seated"]));
    }

    #[test]
    fn test_get_uses_first_non_empty_alias() {
        let mut row = RawRow::new(2);
        row.insert("Count", "");
        row.insert("Party Size", "3");
        assert_eq!(row.get(&["Count", "Party Size"]), Some("3"));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_file(Path::new("/nonexistent/hosts.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}

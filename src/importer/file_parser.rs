// ==========================================
// 文档流转导入工具 - 行读取器实现
// ==========================================
// 支持: Excel (.xlsx) / CSV (.csv)
// 输出: 按位置排列的字符串行（首行为表头，跳过）
// 行号: 源文件中的 1 基行号（表头为第 1 行）
// ==========================================

use crate::domain::document::ImportRow;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// 读取结果: (源文件行号, 导入行)
pub type NumberedRows = Vec<(usize, ImportRow)>;

// ==========================================
// RowReader Trait
// ==========================================
pub trait RowReader {
    fn read_rows(&self, file_path: &Path) -> ImportResult<NumberedRows>;
}

// 文件存在且扩展名匹配
fn check_file(path: &Path, accepted: &[&str]) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = extension_of(path);
    if !accepted.contains(&ext.as_str()) {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// 整行空白视为空行
fn is_blank(values: &[String]) -> bool {
    values.iter().all(|v| v.trim().is_empty())
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvRowReader;

impl RowReader for CsvRowReader {
    fn read_rows(&self, file_path: &Path) -> ImportResult<NumberedRows> {
        check_file(file_path, &["csv"])?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result?;
            // 字段原样保留，去空白由各导入器决定
            let values: Vec<String> = record.iter().map(str::to_string).collect();
            if is_blank(&values) {
                continue;
            }
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 2);
            rows.push((line, ImportRow::new(values)));
        }

        debug!(path = %file_path.display(), rows = rows.len(), "CSV 读取完成");
        Ok(rows)
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelRowReader;

impl RowReader for ExcelRowReader {
    fn read_rows(&self, file_path: &Path) -> ImportResult<NumberedRows> {
        check_file(file_path, &["xlsx"])?;

        let mut workbook: Xlsx<_> = open_workbook(file_path)
            .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // range 可能不从 A1 开始: 行号按起始行偏移，字段按起始列补空
        let (first_row, first_col) = range
            .start()
            .map(|(row, col)| (row as usize, col as usize))
            .unwrap_or((0, 0));

        let mut rows = Vec::new();
        for (index, data_row) in range.rows().enumerate().skip(1) {
            let values: Vec<String> = std::iter::repeat(String::new())
                .take(first_col)
                .chain(data_row.iter().map(cell_text))
                .collect();
            if is_blank(&values) {
                continue;
            }
            rows.push((first_row + index + 1, ImportRow::new(values)));
        }

        debug!(path = %file_path.display(), sheet = %sheet_name, rows = rows.len(), "Excel 读取完成");
        Ok(rows)
    }
}

// 日期单元格输出 OLE 序列号，交给日期解析的序列号回退
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        other => other.to_string(),
    }
}

// ==========================================
// 通用行读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalRowReader;

impl RowReader for UniversalRowReader {
    fn read_rows(&self, file_path: &Path) -> ImportResult<NumberedRows> {
        match extension_of(file_path).as_str() {
            "csv" => CsvRowReader.read_rows(file_path),
            "xlsx" => ExcelRowReader.read_rows(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

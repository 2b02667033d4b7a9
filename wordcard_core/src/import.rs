//! File parsing for vocabulary import (spreadsheet, JSON, CSV and plain text)

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::config::ImportConfig;
use crate::error::{Error, Result};
use crate::words::WordEntry;

/// Import file kinds, detected from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Excel,
    Json,
    Csv,
    Text,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xls" | "xlsm" | "ods" => Ok(FileFormat::Excel),
            "json" => Ok(FileFormat::Json),
            "csv" => Ok(FileFormat::Csv),
            "txt" => Ok(FileFormat::Text),
            _ => Err(Error::UnsupportedFormat(format!(".{}", extension))),
        }
    }
}

/// Read a file from disk and decode it according to its extension.
pub fn import_file(path: &Path, config: &ImportConfig) -> Result<Vec<WordEntry>> {
    let format = FileFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let entries = decode(format, &bytes, config)?;
    info!(path = %path.display(), entries = entries.len(), "decoded import file");
    Ok(entries)
}

/// Decode raw file content. Malformed rows are skipped; only an unreadable
/// payload is an error.
pub fn decode(format: FileFormat, bytes: &[u8], config: &ImportConfig) -> Result<Vec<WordEntry>> {
    match format {
        FileFormat::Excel => parse_spreadsheet(bytes),
        FileFormat::Json => parse_json(&utf8(bytes)?),
        FileFormat::Csv => parse_csv(&utf8(bytes)?, config.delimiter_byte()),
        FileFormat::Text => Ok(parse_lines(&utf8(bytes)?)),
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::ImportFormat(format!("file is not valid UTF-8: {}", e)))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Column positions for term, definition and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMapping {
    term: usize,
    definition: usize,
    tag: Option<usize>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            term: 0,
            definition: 1,
            tag: Some(2),
        }
    }
}

/// Recognize a header row. Returns `None` when the row looks like data.
fn detect_columns(headers: &[String]) -> Option<ColumnMapping> {
    let mut term = None;
    let mut definition = None;
    let mut tag = None;

    for (i, header) in headers.iter().enumerate() {
        match header.trim().to_lowercase().as_str() {
            "english" | "word" | "words" | "term" | "vocabulary" | "영어" | "단어" => {
                term = Some(i)
            }
            "korean" | "meaning" | "meanings" | "definition" | "definitions" | "한국어"
            | "뜻" | "의미" => definition = Some(i),
            "tag" | "pos" | "part of speech" | "품사" => tag = Some(i),
            _ => {}
        }
    }

    Some(ColumnMapping {
        term: term?,
        definition: definition?,
        tag,
    })
}

/// Turn table rows into entries, honoring a header row if one is present.
fn rows_to_entries(rows: Vec<Vec<String>>) -> Vec<WordEntry> {
    let mut rows = rows.into_iter().peekable();
    let header = rows.peek().and_then(|first| detect_columns(first));
    let mapping = match header {
        Some(mapping) => {
            rows.next();
            mapping
        }
        None => ColumnMapping::default(),
    };

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for row in rows {
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");
        let entry = WordEntry::new(
            cell(mapping.term),
            cell(mapping.definition),
            mapping.tag.map(cell).unwrap_or(""),
        );
        if entry.is_complete() {
            entries.push(entry);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped incomplete rows");
    }
    entries
}

/// First sheet of an xlsx/xls/ods workbook.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Vec<WordEntry>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| Error::ImportFormat(format!("failed to open spreadsheet: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::ImportFormat("no sheets found in workbook".into()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::ImportFormat(format!("failed to read sheet: {}", e)))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(rows_to_entries(rows))
}

/// Cell text; errors and blanks read as empty.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
        Data::Empty => String::new(),
    }
}

/// A JSON array of objects with term/definition (or english/korean) keys.
pub fn parse_json(text: &str) -> Result<Vec<WordEntry>> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::ImportFormat(format!("invalid JSON: {}", e)))?;

    let serde_json::Value::Array(items) = value else {
        return Err(Error::ImportFormat("JSON root must be an array".into()));
    };

    let total = items.len();
    let entries: Vec<WordEntry> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<WordEntry>(item).ok())
        .map(|e| WordEntry::new(&e.term, &e.definition, &e.tag))
        .filter(WordEntry::is_complete)
        .collect();

    if entries.len() < total {
        debug!(skipped = total - entries.len(), "skipped malformed JSON items");
    }
    Ok(entries)
}

/// Delimited text without required headers.
pub fn parse_csv(text: &str, delimiter: u8) -> Result<Vec<WordEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => rows.push(record.iter().map(|s| s.to_string()).collect()),
            Err(e) => debug!(error = %e, "skipping unreadable CSV row"),
        }
    }
    Ok(rows_to_entries(rows))
}

const LINE_SEPARATORS: [char; 3] = ['|', ',', ':'];

/// One pair per line, split on the first of `|`, `,` or `:` present.
/// A backslash escapes a separator or another backslash.
/// Used for `.txt` files and for pasted text.
pub fn parse_lines(text: &str) -> Vec<WordEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let present = unescaped_separators(line);
        let Some(separator) = LINE_SEPARATORS.into_iter().find(|c| present.contains(c)) else {
            debug!(line, "skipping line without separator");
            continue;
        };

        let parts = split_escaped(line, separator);
        let field = |i: usize| parts.get(i).map(String::as_str).unwrap_or("");
        let entry = WordEntry::new(field(0), field(1), field(2));
        if entry.is_complete() {
            entries.push(entry);
        }
    }
    entries
}

fn is_escapable(c: char) -> bool {
    c == '\\' || LINE_SEPARATORS.contains(&c)
}

fn unescaped_separators(line: &str) -> Vec<char> {
    let mut seen = Vec::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if LINE_SEPARATORS.contains(&c) && !seen.contains(&c) {
            seen.push(c);
        }
    }
    seen
}

fn split_escaped(line: &str, separator: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next_if(|&next| is_escapable(next)) {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            c if c == separator => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[WordEntry]) -> Vec<(&str, &str, &str)> {
        entries
            .iter()
            .map(|e| (e.term.as_str(), e.definition.as_str(), e.tag.as_str()))
            .collect()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.XLSX")).unwrap(), FileFormat::Excel);
        assert_eq!(FileFormat::from_path(Path::new("a.xls")).unwrap(), FileFormat::Excel);
        assert_eq!(FileFormat::from_path(Path::new("a.json")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("a.csv")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("a.txt")).unwrap(), FileFormat::Text);
        assert!(matches!(
            FileFormat::from_path(Path::new("a.pdf")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(FileFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn header_detection() {
        let headers: Vec<String> = vec!["Tag".into(), "Korean".into(), "English".into()];
        assert_eq!(
            detect_columns(&headers),
            Some(ColumnMapping { term: 2, definition: 1, tag: Some(0) })
        );
        let data: Vec<String> = vec!["apple".into(), "사과".into()];
        assert_eq!(detect_columns(&data), None);
    }

    #[test]
    fn rows_without_header_are_positional() {
        let rows = vec![
            vec!["apple".to_string(), "사과".to_string()],
            vec!["run".to_string(), "달리다".to_string(), "verb".to_string()],
            vec!["lonely".to_string()],
            vec![],
        ];
        let entries = rows_to_entries(rows);
        assert_eq!(pairs(&entries), vec![("apple", "사과", ""), ("run", "달리다", "verb")]);
    }

    #[test]
    fn json_accepts_both_key_styles_and_skips_junk() {
        let text = r#"[
            {"english": "apple", "korean": "사과"},
            {"term": "run", "definition": "달리다", "tag": "verb"},
            {"english": "broken"},
            42,
            {"english": " ", "korean": "공백"}
        ]"#;
        let entries = parse_json(text).unwrap();
        assert_eq!(pairs(&entries), vec![("apple", "사과", ""), ("run", "달리다", "verb")]);
    }

    #[test]
    fn json_root_must_be_array() {
        assert!(matches!(parse_json(r#"{"english": "apple"}"#), Err(Error::ImportFormat(_))));
        assert!(matches!(parse_json("not json"), Err(Error::ImportFormat(_))));
    }

    #[test]
    fn csv_handles_quotes_headers_and_delimiters() {
        let text = "english,korean\napple,사과\n\"sweet, adj\",\"달콤한, 단\"\nbad\n";
        let entries = parse_csv(text, b',').unwrap();
        assert_eq!(pairs(&entries), vec![("apple", "사과", ""), ("sweet, adj", "달콤한, 단", "")]);

        let entries = parse_csv("apple;사과;noun\n", b';').unwrap();
        assert_eq!(pairs(&entries), vec![("apple", "사과", "noun")]);
    }

    #[test]
    fn lines_pick_separator_per_line() {
        let text = "apple,사과\nbanana:바나나\norange | 오렌지, 귤 | noun\n\nnoseparator\ngrape,\n";
        let entries = parse_lines(text);
        assert_eq!(
            pairs(&entries),
            vec![
                ("apple", "사과", ""),
                ("banana", "바나나", ""),
                ("orange", "오렌지, 귤", "noun"),
            ]
        );
    }

    #[test]
    fn lines_honour_backslash_escapes() {
        let text = "either | A \\| B 중 하나\ntime\\: 시간, 때\nC:\\dir | 경로\nslash | 뒤\\\\ | noun\n";
        let entries = parse_lines(text);
        assert_eq!(
            pairs(&entries),
            vec![
                ("either", "A | B 중 하나", ""),
                ("time: 시간", "때", ""),
                ("C:\\dir", "경로", ""),
                ("slash", "뒤\\", "noun"),
            ]
        );
    }

    #[test]
    fn decode_rejects_invalid_utf8_text() {
        let err = decode(FileFormat::Text, &[0xff, 0xfe, 0x00], &ImportConfig::default()).unwrap_err();
        assert!(matches!(err, Error::ImportFormat(_)));
    }

    #[test]
    fn decode_reports_unreadable_spreadsheet() {
        let err = decode(FileFormat::Excel, b"definitely not a workbook", &ImportConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::ImportFormat(_)));
    }

    #[test]
    fn decode_strips_byte_order_mark() {
        let bytes = "\u{feff}apple,사과\n".as_bytes();
        let entries = decode(FileFormat::Csv, bytes, &ImportConfig::default()).unwrap();
        assert_eq!(pairs(&entries), vec![("apple", "사과", "")]);
    }
}

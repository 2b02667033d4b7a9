//! Export encoders for the word list

use chrono::NaiveDate;
use csv::WriterBuilder;
use rust_xlsxwriter::Workbook;

use crate::error::{Error, Result};
use crate::words::WordEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Json,
    Csv,
    Text,
}

impl ExportFormat {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Excel),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "txt" | "text" => Ok(ExportFormat::Text),
            other => Err(Error::UnsupportedFormat(format!("export to '{}'", other))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Text => "text/plain",
        }
    }
}

/// Encoded file ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Encode `entries`, naming the file after `date`.
pub fn encode(format: ExportFormat, entries: &[WordEntry], date: NaiveDate) -> Result<ExportPayload> {
    if entries.is_empty() {
        return Err(Error::NothingToExport);
    }

    let bytes = match format {
        ExportFormat::Excel => encode_spreadsheet(entries)?,
        ExportFormat::Json => serde_json::to_vec_pretty(entries)?,
        ExportFormat::Csv => encode_csv(entries)?,
        ExportFormat::Text => encode_text(entries).into_bytes(),
    };

    Ok(ExportPayload {
        filename: format!("vocabulary_{}.{}", date.format("%Y-%m-%d"), format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}

/// Single "Vocabulary" sheet with a header row, the layout the importer reads.
fn encode_spreadsheet(entries: &[WordEntry]) -> Result<Vec<u8>> {
    let with_tags = entries.iter().any(|e| !e.tag.is_empty());
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Vocabulary")?;

    sheet.write_string(0, 0, "term")?;
    sheet.write_string(0, 1, "definition")?;
    if with_tags {
        sheet.write_string(0, 2, "tag")?;
    }
    for (row, entry) in (1u32..).zip(entries) {
        sheet.write_string(row, 0, entry.term.as_str())?;
        sheet.write_string(row, 1, entry.definition.as_str())?;
        if !entry.tag.is_empty() {
            sheet.write_string(row, 2, entry.tag.as_str())?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn encode_csv(entries: &[WordEntry]) -> Result<Vec<u8>> {
    let with_tags = entries.iter().any(|e| !e.tag.is_empty());
    let mut writer = WriterBuilder::new().flexible(false).from_writer(Vec::new());

    let header = if with_tags {
        writer.write_record(["term", "definition", "tag"])
    } else {
        writer.write_record(["term", "definition"])
    };
    header.map_err(|e| Error::Io(e.into()))?;

    for entry in entries {
        let written = if with_tags {
            writer.write_record([&entry.term, &entry.definition, &entry.tag])
        } else {
            writer.write_record([&entry.term, &entry.definition])
        };
        written.map_err(|e| Error::Io(e.into()))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// `term | definition[ | tag]`, one per line. The pipe keeps commas in
/// meanings intact when the file is imported again; pipes and backslashes
/// inside a field are backslash-escaped.
fn encode_text(entries: &[WordEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            let mut line = format!("{} | {}", escape_field(&e.term), escape_field(&e.definition));
            if !e.tag.is_empty() {
                line.push_str(" | ");
                line.push_str(&escape_field(&e.tag));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_field(field: &str) -> String {
    field.replace('\\', "\\\\").replace('|', "\\|")
}

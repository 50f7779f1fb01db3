//! Minimal CSV reader for the ingest tables.
//!
//! Handles RFC 4180 quoting (`"a,b"`, doubled `""`), CRLF line endings, a
//! UTF-8 BOM and blank lines. Quoted fields may not span lines; the inputs
//! are machine-generated logs where that never happens.

use super::IngestError;

/// Split one CSV record into trimmed fields.
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Column positions resolved from a header line.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    file: String,
    columns: Vec<String>,
}

impl HeaderIndex {
    pub fn new(file: impl Into<String>, header: &str) -> Self {
        HeaderIndex {
            file: file.into(),
            columns: split_record(header),
        }
    }

    /// Position of a required column.
    pub fn require(&self, name: &str) -> Result<usize, IngestError> {
        self.optional(name).ok_or_else(|| IngestError::MissingColumn {
            file: self.file.clone(),
            column: name.to_string(),
        })
    }

    /// Position of an optional column.
    pub fn optional(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn file(&self) -> &str {
        &self.file
    }
}

/// A data line with its 1-based line number in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    /// Field at `idx`, or an error naming the column.
    pub fn get(&self, idx: usize, column: &str) -> Result<&str, String> {
        match self.fields.get(idx) {
            Some(v) if !v.is_empty() => Ok(v.as_str()),
            Some(_) => Err(format!("empty {}", column)),
            None => Err(format!("missing {}", column)),
        }
    }

    /// Parse an unsigned integer field. Accepts `12.0`-style floats written
    /// by dataframe exporters as long as they are integral.
    pub fn get_u32(&self, idx: usize, column: &str) -> Result<u32, String> {
        let raw = self.get(idx, column)?;
        parse_integral(raw)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| format!("{} '{}' is not a non-negative integer", column, raw))
    }

    /// Parse a signed integer field.
    pub fn get_i64(&self, idx: usize, column: &str) -> Result<i64, String> {
        let raw = self.get(idx, column)?;
        parse_integral(raw).ok_or_else(|| format!("{} '{}' is not an integer", column, raw))
    }
}

fn parse_integral(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Split file content into a header index and data records.
///
/// Returns `IngestError::Empty` when the content has no header line.
pub fn read_table(file: &str, content: &str) -> Result<(HeaderIndex, Vec<Record>), IngestError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Err(IngestError::Empty {
            file: file.to_string(),
        });
    };
    let index = HeaderIndex::new(file, header);
    let records = lines
        .map(|(line, text)| Record {
            line,
            fields: split_record(text),
        })
        .collect();
    Ok((index, records))
}

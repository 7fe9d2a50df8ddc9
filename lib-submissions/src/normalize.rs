//! Export normalization
//!
//! Turns the raw spreadsheet export into ordered `Submission` records.
//! Header matching goes through one declarative alias table instead of
//! string checks scattered through the parser, so a reworded form column is
//! a one-line change here.
//!
//! Tolerated input variance: any column order, unknown extra columns,
//! missing optional columns, a UTF-8 byte order mark, comma or semicolon
//! delimiters, and quoted fields with embedded delimiters or doubled
//! quotes. A data row without an address is dropped and logged, never
//! fatal, and output order always matches input order so repeated runs are
//! comparable.

use thiserror::Error;
use tracing::warn;

use crate::types::Submission;

/// Normalization failure. Anything row-recoverable is handled by dropping
/// the row instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("export is empty")]
    Empty,

    #[error("export header has no recognizable address column")]
    NoAddressColumn,

    #[error("malformed input at row {row}: {reason}")]
    MalformedInput { row: usize, reason: String },
}

/// Result of normalizing one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// Records in source order.
    pub submissions: Vec<Submission>,
    /// 1-based data row indexes that were dropped for a missing address.
    pub dropped_rows: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Address,
    Contact,
    ProjectName,
    ProjectUrl,
    SubmittedAt,
}

/// Header alias table. Headers are matched after trimming and lowercasing.
/// The long forms come from the submission form's own export headers.
const COLUMN_ALIASES: &[(Field, &[&str])] = &[
    (
        Field::Address,
        &[
            "address",
            "stellar address",
            "stellar_address",
            "wallet address",
            "public key",
            "your stellar address (public key)",
        ],
    ),
    (
        Field::Contact,
        &["contact", "contact info", "contact information", "email"],
    ),
    (
        Field::ProjectName,
        &["project", "project name", "open source project name"],
    ),
    (
        Field::ProjectUrl,
        &["url", "project url", "repository", "project repository url"],
    ),
    (
        Field::SubmittedAt,
        &["timestamp", "submitted at", "submitted_at", "date"],
    ),
];

/// Column positions resolved from the header row.
#[derive(Debug, Default)]
struct ColumnLayout {
    address: Option<usize>,
    contact: Option<usize>,
    project_name: Option<usize>,
    project_url: Option<usize>,
    submitted_at: Option<usize>,
}

impl ColumnLayout {
    fn resolve(headers: &[String]) -> Self {
        let mut layout = ColumnLayout::default();
        for (index, header) in headers.iter().enumerate() {
            let normalized = header.trim().to_lowercase();
            let matched = COLUMN_ALIASES
                .iter()
                .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
                .map(|(field, _)| *field);

            // First match wins; later duplicate headers are ignored.
            let slot = match matched {
                Some(Field::Address) => &mut layout.address,
                Some(Field::Contact) => &mut layout.contact,
                Some(Field::ProjectName) => &mut layout.project_name,
                Some(Field::ProjectUrl) => &mut layout.project_url,
                Some(Field::SubmittedAt) => &mut layout.submitted_at,
                None => continue,
            };
            slot.get_or_insert(index);
        }
        layout
    }
}

/// Normalize a raw export into submission records.
pub fn normalize_export(raw: &[u8]) -> Result<NormalizedBatch, NormalizeError> {
    let text = String::from_utf8_lossy(raw);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    if text.trim().is_empty() {
        return Err(NormalizeError::Empty);
    }

    let delimiter = sniff_delimiter(text);
    let rows = parse_rows(text, delimiter)?;

    let mut iter = rows.into_iter();
    let headers = iter.next().ok_or(NormalizeError::Empty)?;
    let layout = ColumnLayout::resolve(&headers);
    let address_col = layout.address.ok_or(NormalizeError::NoAddressColumn)?;

    let mut submissions = Vec::new();
    let mut dropped_rows = Vec::new();

    for (offset, row) in iter.enumerate() {
        let data_row = offset + 1;

        // Blank lines at the end of an export are common; skip silently.
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let address = cell(&row, Some(address_col));
        let Some(address) = address else {
            warn!(row = data_row, "dropping row with no address");
            dropped_rows.push(data_row);
            continue;
        };

        submissions.push(Submission {
            address,
            contact: cell(&row, layout.contact),
            project_name: cell(&row, layout.project_name),
            project_url: cell(&row, layout.project_url),
            submitted_at: cell(&row, layout.submitted_at),
            row: data_row,
        });
    }

    Ok(NormalizedBatch {
        submissions,
        dropped_rows,
    })
}

/// Fetch a trimmed cell, mapping absent or empty cells to `None`.
fn cell(row: &[String], index: Option<usize>) -> Option<String> {
    let value = row.get(index?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Pick the delimiter from the header line. Semicolon exports exist in the
/// wild when the sheet locale uses decimal commas.
fn sniff_delimiter(text: &str) -> char {
    let header = text.lines().next().unwrap_or("");
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Split the export into rows of cells.
///
/// Handles quoted fields, doubled quotes inside quoted fields, and quoted
/// line breaks. An unterminated quote is a stream-level failure.
fn parse_rows(text: &str, delimiter: char) -> Result<Vec<Vec<String>>, NormalizeError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            c if c == delimiter => row.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(NormalizeError::MalformedInput {
            row: rows.len() + 1,
            reason: "unterminated quoted field".to_string(),
        });
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

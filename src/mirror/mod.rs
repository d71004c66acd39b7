//! Spreadsheet mirror: push the displayed two-column counts to an external
//! spreadsheet.
//!
//! Every push opens (or creates) the configured spreadsheet, clears the
//! worksheet and writes a header row followed by one row per point. There is
//! no conflict detection; the last writer wins.
//!
//! Failures never abort the caller. [`push`] logs them and hands back a
//! [`MirrorOutcome`] carrying the warning text.

pub mod sheets;

use std::path::PathBuf;

use serde::Serialize;

pub use sheets::SheetsClient;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("spreadsheet mirror is disabled")]
    Disabled,
    #[error("credentials not found at {0}")]
    CredentialsNotFound(PathBuf),
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Spreadsheet seam
// ---------------------------------------------------------------------------

/// A remote worksheet that can be wiped and rewritten.
pub trait Spreadsheet {
    /// Remove every row from the worksheet.
    fn clear(&mut self) -> Result<(), MirrorError>;
    /// Write `rows` starting at the top-left cell.
    fn write_rows(&mut self, rows: &[Vec<String>]) -> Result<(), MirrorError>;
}

/// Clear the worksheet and write `header` plus one row per point.
///
/// Returns the number of data rows written.
pub fn mirror_table<S: Spreadsheet + ?Sized>(
    sheet: &mut S,
    header: [&str; 2],
    points: &[(String, usize)],
) -> Result<usize, MirrorError> {
    let mut rows = Vec::with_capacity(points.len() + 1);
    rows.push(header.iter().map(|h| h.to_string()).collect());
    rows.extend(
        points
            .iter()
            .map(|(label, count)| vec![label.clone(), count.to_string()]),
    );

    sheet.clear()?;
    sheet.write_rows(&rows)?;
    Ok(points.len())
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of a mirror attempt as reported to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MirrorOutcome {
    pub ok: bool,
    pub rows: usize,
    pub warning: Option<String>,
}

impl MirrorOutcome {
    fn warning(message: String) -> Self {
        Self {
            ok: false,
            rows: 0,
            warning: Some(message),
        }
    }
}

/// Push points through `sheet`, turning any failure into a warning.
pub fn push<S: Spreadsheet + ?Sized>(
    sheet: &mut S,
    header: [&str; 2],
    points: &[(String, usize)],
) -> MirrorOutcome {
    match mirror_table(sheet, header, points) {
        Ok(rows) => {
            log::info!("mirrored {rows} rows");
            MirrorOutcome {
                ok: true,
                rows,
                warning: None,
            }
        }
        Err(e) => failed(e),
    }
}

/// Log a mirror error and wrap it as a warning outcome.
pub fn failed(error: MirrorError) -> MirrorOutcome {
    log::warn!("spreadsheet mirror failed: {error}");
    MirrorOutcome::warning(format!("Spreadsheet mirror failed: {error}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
        rows: Vec<Vec<String>>,
        fail_write: bool,
    }

    impl Spreadsheet for Recording {
        fn clear(&mut self) -> Result<(), MirrorError> {
            self.calls.push("clear".into());
            self.rows.clear();
            Ok(())
        }

        fn write_rows(&mut self, rows: &[Vec<String>]) -> Result<(), MirrorError> {
            self.calls.push("write".into());
            if self.fail_write {
                return Err(MirrorError::Api {
                    status: 403,
                    message: "forbidden".into(),
                });
            }
            self.rows = rows.to_vec();
            Ok(())
        }
    }

    fn points() -> Vec<(String, usize)> {
        vec![("Mood".into(), 3), ("Other".into(), 1)]
    }

    #[test]
    fn clears_then_writes_header_and_rows() {
        let mut sheet = Recording::default();
        let written = mirror_table(&mut sheet, ["Category", "Count"], &points()).unwrap();
        assert_eq!(written, 2);
        assert_eq!(sheet.calls, vec!["clear", "write"]);
        assert_eq!(sheet.rows[0], vec!["Category", "Count"]);
        assert_eq!(sheet.rows[2], vec!["Other", "1"]);
    }

    #[test]
    fn second_push_replaces_previous_rows() {
        let mut sheet = Recording::default();
        push(&mut sheet, ["Category", "Count"], &points());
        push(&mut sheet, ["Tag", "Count"], &[("sleep".into(), 7)]);
        assert_eq!(sheet.rows, vec![vec!["Tag", "Count"], vec!["sleep", "7"]]);
    }

    #[test]
    fn empty_points_still_write_header() {
        let mut sheet = Recording::default();
        let outcome = push(&mut sheet, ["Tag", "Count"], &[]);
        assert!(outcome.ok);
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn failure_becomes_warning() {
        let mut sheet = Recording {
            fail_write: true,
            ..Recording::default()
        };
        let outcome = push(&mut sheet, ["Tag", "Count"], &points());
        assert!(!outcome.ok);
        assert!(outcome.warning.unwrap().contains("403"));
    }
}

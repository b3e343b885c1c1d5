//! CSV outputs of the three runs.

use crate::calendar::format_date;
use crate::workflows::{AvailabilityMatrix, ReservationHistoryRecord, ReservationOutcome};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const AVAILABILITY_FILE: &str = "availability_matrix.csv";
pub const OUTCOMES_FILE: &str = "reservation_results.csv";
pub const HISTORY_FILE: &str = "reservation_history.csv";

pub const AVAILABLE_MARK: &str = "○";
pub const UNAVAILABLE_MARK: &str = "×";

const OUTCOME_HEADER: [&str; 4] = ["facility", "date", "reservationNumber", "status"];
const HISTORY_HEADER: [&str; 5] = [
    "startTime",
    "endTime",
    "facility",
    "reservationNumber",
    "status",
];

#[derive(Debug)]
pub enum ReportError {
    Io { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            ReportError::Csv(err) => write!(f, "invalid CSV output: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io { source, .. } => Some(source),
            ReportError::Csv(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeRow<'a> {
    facility: &'a str,
    date: String,
    reservation_number: &'a str,
    status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRow<'a> {
    start_time: &'a str,
    end_time: &'a str,
    facility: &'a str,
    reservation_number: &'a str,
    status: &'a str,
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(writer)
}

/// One row per facility, one column per date, `○`/`×` per cell.
pub fn write_availability_matrix<W: Write>(
    writer: W,
    matrix: &AvailabilityMatrix,
) -> Result<(), ReportError> {
    let dates = matrix.dates();
    let mut out = csv_writer(writer);

    let mut header = vec!["facility".to_string()];
    header.extend(dates.iter().map(|date| format_date(*date)));
    out.write_record(&header)?;

    for facility in matrix.facilities() {
        let mut row = vec![facility.to_string()];
        row.extend(dates.iter().map(|date| {
            if matrix.is_available(facility, *date) {
                AVAILABLE_MARK.to_string()
            } else {
                UNAVAILABLE_MARK.to_string()
            }
        }));
        out.write_record(&row)?;
    }

    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_outcomes<W: Write>(
    writer: W,
    outcomes: &[ReservationOutcome],
) -> Result<(), ReportError> {
    let mut out = csv_writer(writer);
    out.write_record(OUTCOME_HEADER)?;
    for outcome in outcomes {
        out.serialize(OutcomeRow {
            facility: outcome.facility.as_str(),
            date: outcome.date_label(),
            reservation_number: outcome.reservation_number.as_deref().unwrap_or_default(),
            status: outcome.status.label(),
        })?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_history<W: Write>(
    writer: W,
    records: &[ReservationHistoryRecord],
) -> Result<(), ReportError> {
    let mut out = csv_writer(writer);
    out.write_record(HISTORY_HEADER)?;
    for record in records {
        out.serialize(HistoryRow {
            start_time: &record.start_time,
            end_time: &record.end_time,
            facility: &record.facility,
            reservation_number: &record.reservation_number,
            status: &record.status,
        })?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes the report files under one output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn availability(&self, matrix: &AvailabilityMatrix) -> Result<PathBuf, ReportError> {
        self.save(AVAILABILITY_FILE, |file| write_availability_matrix(file, matrix))
    }

    pub fn outcomes(&self, outcomes: &[ReservationOutcome]) -> Result<PathBuf, ReportError> {
        self.save(OUTCOMES_FILE, |file| write_outcomes(file, outcomes))
    }

    pub fn history(&self, records: &[ReservationHistoryRecord]) -> Result<PathBuf, ReportError> {
        self.save(HISTORY_FILE, |file| write_history(file, records))
    }

    fn save<F>(&self, name: &str, write: F) -> Result<PathBuf, ReportError>
    where
        F: FnOnce(File) -> Result<(), ReportError>,
    {
        fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        let path = self.output_dir.join(name);
        let file = File::create(&path).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        write(file)?;

        info!(path = %path.display(), "report written");
        Ok(path)
    }
}

//! CSV export of predictions and confusion matrices, and ledger persistence.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::evaluation::ConfusionMatrix;
use crate::horizon::{LedgerRow, PredictionLedger};
use crate::tempo::pipeline::DailyPrediction;
use crate::tempo::types::TempoColor;

/// Column header of the predictions export.
const HEADER: &str = "date,known_color,net_demand,normalized_score,stock_red,stock_white,\
                      threshold_red,threshold_white_red,prediction_red,prediction_white,\
                      prediction_blue,predicted_color";

/// Exports predictions to a CSV file at the given path.
///
/// Writes a header row followed by one row per day, in input order.
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_predictions(predictions: &[DailyPrediction], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_predictions(predictions, io::BufWriter::new(file))
}

/// Writes predictions as CSV to any writer.
///
/// Unknown colors are written as empty fields and NaN scores as `NaN`.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_predictions(predictions: &[DailyPrediction], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for p in predictions {
        wtr.write_record(&[
            p.date.to_string(),
            p.known_color.map_or("", TempoColor::as_str).to_owned(),
            format!("{:.1}", p.net_demand),
            format!("{:.4}", p.normalized_score),
            p.stock_red.to_string(),
            p.stock_white.to_string(),
            format!("{:.4}", p.threshold_red),
            format!("{:.4}", p.threshold_white_red),
            p.prediction_red.to_string(),
            p.prediction_white.to_string(),
            p.prediction_blue.to_string(),
            p.predicted_color.as_str().to_owned(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a confusion matrix to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_confusion(matrix: &ConfusionMatrix, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_confusion(matrix, io::BufWriter::new(file))
}

/// Writes a confusion matrix as CSV: one row per realized label, one
/// column per predicted label, both in label order.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_confusion(matrix: &ConfusionMatrix, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let columns: Vec<_> = matrix.column_labels().collect();

    let mut header = vec!["known_color".to_owned()];
    header.extend(columns.iter().map(|c| c.as_str().to_owned()));
    wtr.write_record(&header)?;

    for row in matrix.row_labels() {
        let mut record = vec![row.as_str().to_owned()];
        record.extend(columns.iter().map(|c| matrix.count(row, *c).to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Loads a ledger from `path`, or an empty ledger if the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_ledger(path: &Path) -> Result<PredictionLedger> {
    match File::open(path) {
        Ok(file) => read_ledger(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(PredictionLedger::new()),
        Err(e) => Err(e.into()),
    }
}

/// Parses a ledger from CSV.
///
/// # Errors
///
/// Returns a CSV error on malformed rows or unknown colors.
pub fn read_ledger(reader: impl Read) -> Result<PredictionLedger> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let rows = rdr
        .deserialize::<LedgerRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(PredictionLedger::from_rows(rows))
}

/// Writes a ledger to `path`, replacing any previous file.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn save_ledger(ledger: &PredictionLedger, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_ledger(ledger, io::BufWriter::new(file))
}

/// Writes a ledger as CSV, one row per date in date order.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_ledger(ledger: &PredictionLedger, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    for row in ledger.rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

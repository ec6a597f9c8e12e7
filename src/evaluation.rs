//! Post-hoc evaluation of predictions against realized tempo colors.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Result, TempoError};
use crate::tempo::pipeline::DailyPrediction;
use crate::tempo::types::TempoColor;

/// Row/column label of the confusion matrix.
///
/// Days without a realized color are tabulated as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayLabel {
    Red,
    White,
    Blue,
    Unknown,
}

impl DayLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            DayLabel::Red => "RED",
            DayLabel::White => "WHITE",
            DayLabel::Blue => "BLUE",
            DayLabel::Unknown => "UNKNOWN",
        }
    }
}

impl From<TempoColor> for DayLabel {
    fn from(color: TempoColor) -> Self {
        match color {
            TempoColor::Red => DayLabel::Red,
            TempoColor::White => DayLabel::White,
            TempoColor::Blue => DayLabel::Blue,
        }
    }
}

impl From<Option<TempoColor>> for DayLabel {
    fn from(color: Option<TempoColor>) -> Self {
        color.map_or(DayLabel::Unknown, DayLabel::from)
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prediction given as three boolean columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneHot {
    pub red: bool,
    pub white: bool,
    pub blue: bool,
}

impl OneHot {
    /// Column holding the maximum; ties go to the first column (red, white, blue).
    pub fn argmax(&self) -> TempoColor {
        let flags = [self.red, self.white, self.blue];
        let best = flags.iter().copied().max().unwrap_or(false);
        TempoColor::ALL
            .iter()
            .zip(flags)
            .find(|(_, flag)| *flag == best)
            .map_or(TempoColor::Red, |(color, _)| *color)
    }
}

impl From<&DailyPrediction> for OneHot {
    fn from(p: &DailyPrediction) -> Self {
        Self {
            red: p.prediction_red,
            white: p.prediction_white,
            blue: p.prediction_blue,
        }
    }
}

/// Cross-tabulation of true labels (rows) against predicted labels (columns).
///
/// Only labels that occur appear as rows or columns; cells hold raw counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    rows: BTreeSet<DayLabel>,
    columns: BTreeSet<DayLabel>,
    counts: BTreeMap<(DayLabel, DayLabel), usize>,
}

impl ConfusionMatrix {
    /// Counts `(truth, predicted)` pairs.
    pub fn tabulate(pairs: impl IntoIterator<Item = (DayLabel, DayLabel)>) -> Self {
        let mut matrix = Self::default();
        for (truth, predicted) in pairs {
            matrix.rows.insert(truth);
            matrix.columns.insert(predicted);
            *matrix.counts.entry((truth, predicted)).or_insert(0) += 1;
        }
        matrix
    }

    /// Builds the matrix from categorical predictions.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::LengthMismatch`] if the slices differ in length.
    pub fn from_labels(truth: &[Option<TempoColor>], predicted: &[Option<TempoColor>]) -> Result<Self> {
        check_lengths(truth.len(), predicted.len())?;
        Ok(Self::tabulate(
            truth
                .iter()
                .zip(predicted)
                .map(|(t, p)| (DayLabel::from(*t), DayLabel::from(*p))),
        ))
    }

    /// Builds the matrix from one-hot predictions, reduced by arg-max.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::LengthMismatch`] if the slices differ in length.
    pub fn from_one_hot(truth: &[Option<TempoColor>], predicted: &[OneHot]) -> Result<Self> {
        check_lengths(truth.len(), predicted.len())?;
        Ok(Self::tabulate(
            truth
                .iter()
                .zip(predicted)
                .map(|(t, p)| (DayLabel::from(*t), DayLabel::from(p.argmax()))),
        ))
    }

    /// Builds the matrix from pipeline predictions using their boolean columns.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::LengthMismatch`] if the slices differ in length.
    pub fn from_predictions(truth: &[Option<TempoColor>], predicted: &[DailyPrediction]) -> Result<Self> {
        let one_hot: Vec<OneHot> = predicted.iter().map(OneHot::from).collect();
        Self::from_one_hot(truth, &one_hot)
    }

    /// Count of days with the given true and predicted labels.
    pub fn count(&self, truth: DayLabel, predicted: DayLabel) -> usize {
        self.counts.get(&(truth, predicted)).copied().unwrap_or(0)
    }

    pub fn row_labels(&self) -> impl Iterator<Item = DayLabel> + '_ {
        self.rows.iter().copied()
    }

    pub fn column_labels(&self) -> impl Iterator<Item = DayLabel> + '_ {
        self.columns.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of tabulated days.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Whether every off-diagonal cell is zero.
    pub fn is_diagonal(&self) -> bool {
        self.counts.iter().all(|((t, p), n)| t == p || *n == 0)
    }

    /// Days whose predicted label equals the true label.
    pub fn matches(&self) -> usize {
        self.counts
            .iter()
            .filter(|((t, p), _)| t == p)
            .map(|(_, n)| *n)
            .sum()
    }
}

fn check_lengths(truth: usize, predicted: usize) -> Result<()> {
    if truth == predicted {
        Ok(())
    } else {
        Err(TempoError::LengthMismatch { truth, predicted })
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty confusion matrix)");
        }
        write!(f, "{:<10}", "true\\pred")?;
        for col in &self.columns {
            write!(f, "{:>9}", col.as_str())?;
        }
        for row in &self.rows {
            write!(f, "\n{:<10}", row.as_str())?;
            for col in &self.columns {
                write!(f, "{:>9}", self.count(*row, *col))?;
            }
        }
        Ok(())
    }
}

/// Aggregate accuracy figures derived from a confusion matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// Days tabulated.
    pub total_days: usize,
    /// Days with a realized color.
    pub known_days: usize,
    /// Known days whose prediction matched.
    pub correct_days: usize,
    /// `correct_days / known_days` in percent (0 when nothing is known).
    pub accuracy_pct: f64,
    pub predicted_red: usize,
    pub predicted_white: usize,
    pub predicted_blue: usize,
}

impl EvaluationReport {
    pub fn from_matrix(matrix: &ConfusionMatrix) -> Self {
        let column_total = |col: DayLabel| -> usize {
            matrix.row_labels().map(|row| matrix.count(row, col)).sum()
        };
        let unknown: usize = matrix
            .column_labels()
            .map(|col| matrix.count(DayLabel::Unknown, col))
            .sum();
        let total_days = matrix.total();
        let known_days = total_days - unknown;
        let correct_days = matrix.matches() - matrix.count(DayLabel::Unknown, DayLabel::Unknown);

        let accuracy_pct = if known_days > 0 {
            100.0 * correct_days as f64 / known_days as f64
        } else {
            0.0
        };

        Self {
            total_days,
            known_days,
            correct_days,
            accuracy_pct,
            predicted_red: column_total(DayLabel::Red),
            predicted_white: column_total(DayLabel::White),
            predicted_blue: column_total(DayLabel::Blue),
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Evaluation Report ---")?;
        writeln!(f, "Days evaluated:        {}", self.total_days)?;
        writeln!(f, "Days with known color: {}", self.known_days)?;
        writeln!(f, "Correct predictions:   {}", self.correct_days)?;
        writeln!(f, "Accuracy:              {:.1}%", self.accuracy_pct)?;
        writeln!(f, "Predicted red days:    {}", self.predicted_red)?;
        writeln!(f, "Predicted white days:  {}", self.predicted_white)?;
        write!(f, "Predicted blue days:   {}", self.predicted_blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TempoColor::{Blue, Red, White};

    #[test]
    fn identical_labels_give_diagonal_matrix() {
        let truth = vec![Some(Red), Some(White), Some(Blue), Some(Blue), None];
        let matrix = ConfusionMatrix::from_labels(&truth, &truth).expect("same length");
        assert!(matrix.is_diagonal());
        assert_eq!(matrix.count(DayLabel::Blue, DayLabel::Blue), 2);
        assert_eq!(matrix.count(DayLabel::Unknown, DayLabel::Unknown), 1);
        assert_eq!(matrix.total(), 5);
    }

    #[test]
    fn off_diagonal_counts() {
        let truth = vec![Some(Red), Some(Red), Some(White), None];
        let predicted = vec![Some(Red), Some(White), Some(Blue), Some(Blue)];
        let matrix = ConfusionMatrix::from_labels(&truth, &predicted).expect("same length");
        assert!(!matrix.is_diagonal());
        assert_eq!(matrix.count(DayLabel::Red, DayLabel::White), 1);
        assert_eq!(matrix.count(DayLabel::White, DayLabel::Blue), 1);
        assert_eq!(matrix.count(DayLabel::Unknown, DayLabel::Blue), 1);
        assert_eq!(matrix.count(DayLabel::Blue, DayLabel::Blue), 0);
        let rows: Vec<DayLabel> = matrix.row_labels().collect();
        assert_eq!(rows, vec![DayLabel::Red, DayLabel::White, DayLabel::Unknown]);
    }

    #[test]
    fn one_hot_is_reduced_by_argmax() {
        let truth = vec![Some(White), Some(Blue)];
        let predicted = vec![
            OneHot {
                red: false,
                white: true,
                blue: false,
            },
            OneHot {
                red: false,
                white: false,
                blue: true,
            },
        ];
        let matrix = ConfusionMatrix::from_one_hot(&truth, &predicted).expect("same length");
        assert!(matrix.is_diagonal());
        assert_eq!(matrix.matches(), 2);
    }

    #[test]
    fn argmax_ties_go_to_first_column() {
        let all_false = OneHot {
            red: false,
            white: false,
            blue: false,
        };
        assert_eq!(all_false.argmax(), Red);
        let two = OneHot {
            red: false,
            white: true,
            blue: true,
        };
        assert_eq!(two.argmax(), White);
    }

    #[test]
    fn empty_inputs_give_empty_matrix() {
        let matrix = ConfusionMatrix::from_labels(&[], &[]).expect("same length");
        assert!(matrix.is_empty());
        assert_eq!(matrix.to_string(), "(empty confusion matrix)");
        let report = EvaluationReport::from_matrix(&matrix);
        assert_eq!(report.total_days, 0);
        assert_eq!(report.accuracy_pct, 0.0);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let result = ConfusionMatrix::from_labels(&[Some(Red)], &[]);
        assert!(matches!(
            result,
            Err(TempoError::LengthMismatch {
                truth: 1,
                predicted: 0
            })
        ));
    }

    #[test]
    fn report_excludes_unknown_truth_from_accuracy() {
        let truth = vec![Some(Red), Some(Blue), Some(Blue), None, None];
        let predicted = vec![Some(Red), Some(Blue), Some(White), Some(Blue), Some(Red)];
        let matrix = ConfusionMatrix::from_labels(&truth, &predicted).expect("same length");
        let report = EvaluationReport::from_matrix(&matrix);
        assert_eq!(report.total_days, 5);
        assert_eq!(report.known_days, 3);
        assert_eq!(report.correct_days, 2);
        assert!((report.accuracy_pct - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.predicted_red, 2);
        assert_eq!(report.predicted_white, 1);
        assert_eq!(report.predicted_blue, 2);
    }

    #[test]
    fn display_lists_labels() {
        let truth = vec![Some(Red), Some(Blue)];
        let matrix = ConfusionMatrix::from_labels(&truth, &truth).expect("same length");
        let text = matrix.to_string();
        let header = text.lines().next().unwrap_or("");
        assert!(header.contains("RED") && header.contains("BLUE"));
        assert!(!header.contains("WHITE"));
        assert_eq!(text.lines().count(), 3);
    }
}

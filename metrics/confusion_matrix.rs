use super::Metric;
use fnv::FnvHashMap;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use tracing::warn;

/// Added to every denominator of the scaled confusion matrix so empty rows and columns do not divide by zero.
pub const EPS: f64 = 1e-10;

/**
A confusion matrix over a fixed, ordered label vocabulary.

`raw[(i, j)]` is the number of examples whose true label is `labels[i]` and whose predicted label is `labels[j]`. `scaled` has the same shape and holds values in `[-1, 1]` meant for visualization:

- On the diagonal, the F1 score of label `i`: the harmonic mean of `raw[(i, i)] / (row_total + EPS)` and `raw[(i, i)] / (column_total + EPS)`. If label `i` never occurs as a true or a predicted label the entry is `-1`.
- Off the diagonal, `1 - harmonic_mean(1 - raw[(i, j)] / (row_total + EPS), 1 - raw[(i, j)] / (column_total + EPS))`. This goes to one as the entry dominates either its row or its column, so a confusion that swamps a rare class is flagged even when it is a small share of the common one.
*/
#[derive(Clone, Debug)]
pub struct ConfusionMatrix {
	pub raw: Array2<u64>,
	pub scaled: Array2<f64>,
}

pub struct ConfusionMatrixInput<'a> {
	pub labels: &'a [String],
	pub y_true: &'a [String],
	pub y_pred: &'a [String],
}

impl<'a> Metric<'a> for ConfusionMatrix {
	type Input = ConfusionMatrixInput<'a>;
	type Output = ConfusionMatrix;

	fn compute(input: ConfusionMatrixInput<'a>) -> ConfusionMatrix {
		let raw = base_confusion_matrix(input.y_true, input.y_pred, input.labels);
		ConfusionMatrix::from_raw(raw)
	}
}

impl ConfusionMatrix {
	pub fn from_raw(raw: Array2<u64>) -> ConfusionMatrix {
		let n_labels = raw.nrows();
		let raw_f64 = raw.mapv(|count| count.to_f64().unwrap());
		let row_totals = raw_f64.sum_axis(Axis(1));
		let column_totals = raw_f64.sum_axis(Axis(0));
		let mut scaled = Array2::zeros((n_labels, n_labels));
		for ((i, j), value) in scaled.indexed_iter_mut() {
			let count = raw_f64[(i, j)];
			*value = if i == j {
				if row_totals[i] == 0.0 && column_totals[i] == 0.0 {
					-1.0
				} else {
					let recall = count / (row_totals[i] + EPS);
					let precision = count / (column_totals[i] + EPS);
					harmonic_mean(recall, precision)
				}
			} else {
				let inverse_row_fraction = 1.0 - count / (row_totals[i] + EPS);
				let inverse_column_fraction = 1.0 - count / (column_totals[j] + EPS);
				1.0 - harmonic_mean(inverse_column_fraction, inverse_row_fraction)
			};
		}
		ConfusionMatrix { raw, scaled }
	}
}

/// `2 / (1 / x + 1 / y)`. A zero argument yields zero.
pub fn harmonic_mean(x: f64, y: f64) -> f64 {
	2.0 / ((1.0 / x) + (1.0 / y))
}

/**
Count `(true, predicted)` pairs into a `labels.len()` square matrix, rows indexed by the true label and columns by the predicted label. Pairs with either label outside `labels` are logged and skipped.
*/
pub fn base_confusion_matrix<S>(y_true: &[S], y_pred: &[S], labels: &[S]) -> Array2<u64>
where
	S: AsRef<str>,
{
	let n_labels = labels.len();
	let label_map: FnvHashMap<&str, usize> = labels
		.iter()
		.enumerate()
		.map(|(index, label)| (label.as_ref(), index))
		.collect();
	let mut confusion_matrix = Array2::zeros((n_labels, n_labels));
	for (label, prediction) in y_true.iter().zip(y_pred.iter()) {
		let label = label.as_ref();
		let prediction = prediction.as_ref();
		let row = match label_map.get(label) {
			Some(row) => *row,
			None => {
				warn!("{} not in label map", label);
				continue;
			}
		};
		let column = match label_map.get(prediction) {
			Some(column) => *column,
			None => {
				warn!("{} not in label map", prediction);
				continue;
			}
		};
		confusion_matrix[(row, column)] += 1;
	}
	confusion_matrix
}

#[cfg(test)]
fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn test_base_confusion_matrix() {
	let labels = strings(&["cargo", "tug", "trawlers"]);
	let y_true = strings(&["cargo", "cargo", "tug", "trawlers", "squid_jigger", "tug"]);
	let y_pred = strings(&["cargo", "tug", "tug", "cargo", "trawlers", "reefer"]);
	let raw = base_confusion_matrix(&y_true, &y_pred, &labels);
	assert_eq!(raw, arr2(&[[1, 1, 0], [0, 1, 0], [1, 0, 0]]));
	// Only pairs with both labels in the vocabulary are counted.
	assert_eq!(raw.sum(), 4);
}

#[test]
fn test_scaled_confusion_matrix() {
	let labels = strings(&["cargo", "tug", "gear"]);
	let y_true = strings(&["cargo", "cargo", "cargo", "tug"]);
	let y_pred = strings(&["cargo", "cargo", "tug", "tug"]);
	let confusion_matrix = ConfusionMatrix::compute(ConfusionMatrixInput {
		labels: &labels,
		y_true: &y_true,
		y_pred: &y_pred,
	});
	let scaled = &confusion_matrix.scaled;
	// cargo: recall 2 / 3, precision 1.
	assert!((scaled[(0, 0)] - 0.8).abs() < 1e-6);
	// tug: recall 1, precision 1 / 2.
	assert!((scaled[(1, 1)] - 2.0 / 3.0).abs() < 1e-6);
	// gear never occurs.
	assert_eq!(scaled[(2, 2)], -1.0);
	// cargo predicted as tug is half of the tug column.
	let expected = 1.0 - harmonic_mean(0.5, 2.0 / 3.0);
	assert!((scaled[(0, 1)] - expected).abs() < 1e-6);
	for ((i, j), value) in scaled.indexed_iter() {
		if i != j {
			assert!(*value >= 0.0 && *value <= 1.0);
		}
	}
	assert_eq!(scaled[(1, 0)], 0.0);
}

#[test]
fn test_dominating_off_diagonal() {
	// Every "tug" is predicted as "cargo" and nothing else is.
	let labels = strings(&["cargo", "tug"]);
	let y_true = strings(&["tug", "tug"]);
	let y_pred = strings(&["cargo", "cargo"]);
	let confusion_matrix = ConfusionMatrix::compute(ConfusionMatrixInput {
		labels: &labels,
		y_true: &y_true,
		y_pred: &y_pred,
	});
	assert!((confusion_matrix.scaled[(1, 0)] - 1.0).abs() < 1e-6);
	assert_eq!(confusion_matrix.scaled[(0, 0)], 0.0);
	assert_eq!(confusion_matrix.scaled[(1, 1)], 0.0);
}

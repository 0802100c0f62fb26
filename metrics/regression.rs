use super::{
	mean_variance::{m2_to_variance, merge_mean_m2},
	StreamingMetric,
};
use itertools::Itertools;
use num_traits::ToPrimitive;

/// `RegressionMetrics` accumulates the error of a continuous prediction against its label. Pairs where either value is `NaN` are ignored.
#[derive(Clone, Debug, Default)]
pub struct RegressionMetrics {
	mean_variance: Option<MeanVariance>,
	absolute_error: f64,
	squared_error: f64,
}

#[derive(Clone, Debug)]
struct MeanVariance {
	n: u64,
	m2: f64,
	mean: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegressionMetricsOutput {
	pub n: u64,
	pub mse: f64,
	pub rmse: f64,
	pub mae: f64,
	/// The mean of the labels.
	pub label_mean: f64,
	/// The population standard deviation of the labels.
	pub label_std: f64,
}

impl RegressionMetrics {
	pub fn new() -> Self {
		Self::default()
	}
}

impl StreamingMetric<'_> for RegressionMetrics {
	/// (prediction, label)
	type Input = (f64, f64);
	type Output = RegressionMetricsOutput;

	fn update(&mut self, (prediction, label): (f64, f64)) {
		if prediction.is_nan() || label.is_nan() {
			return;
		}
		match &mut self.mean_variance {
			Some(mean_variance) => {
				let (mean, m2) = merge_mean_m2(
					mean_variance.n,
					mean_variance.mean,
					mean_variance.m2,
					1,
					label,
					0.0,
				);
				mean_variance.n += 1;
				mean_variance.mean = mean;
				mean_variance.m2 = m2;
			}
			None => {
				self.mean_variance = Some(MeanVariance {
					n: 1,
					mean: label,
					m2: 0.0,
				})
			}
		}
		let error = prediction - label;
		self.absolute_error += error.abs();
		self.squared_error += error * error;
	}

	fn merge(&mut self, other: Self) {
		match &mut self.mean_variance {
			Some(mean_variance) => {
				if let Some(other) = other.mean_variance {
					let (mean, m2) = merge_mean_m2(
						mean_variance.n,
						mean_variance.mean,
						mean_variance.m2,
						other.n,
						other.mean,
						other.m2,
					);
					mean_variance.mean = mean;
					mean_variance.m2 = m2;
					mean_variance.n += other.n;
				}
			}
			None => {
				self.mean_variance = other.mean_variance;
			}
		}
		self.absolute_error += other.absolute_error;
		self.squared_error += other.squared_error;
	}

	fn finalize(self) -> RegressionMetricsOutput {
		let (n, label_mean, variance) = match self.mean_variance {
			Some(m) => (m.n, m.mean, m2_to_variance(m.m2, m.n)),
			None => (0, f64::NAN, f64::NAN),
		};
		let n_f64 = n.to_f64().unwrap();
		let mse = self.squared_error / n_f64;
		RegressionMetricsOutput {
			n,
			mse,
			rmse: mse.sqrt(),
			mae: self.absolute_error / n_f64,
			label_mean,
			label_std: variance.sqrt(),
		}
	}
}

/// The root mean squared difference between `a` and `b`. `NaN` for empty input.
pub fn rms_error(a: &[f64], b: &[f64]) -> f64 {
	let n = a.len().to_f64().unwrap();
	let sum: f64 = a.iter().zip(b.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
	(sum / n).sqrt()
}

/// The mean absolute difference between `a` and `b`. `NaN` for empty input.
pub fn mean_absolute_error(a: &[f64], b: &[f64]) -> f64 {
	let n = a.len().to_f64().unwrap();
	let sum: f64 = a.iter().zip(b.iter()).map(|(a, b)| (a - b).abs()).sum();
	sum / n
}

/// One row of the error by label table.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelErrorMetrics {
	pub label: String,
	pub count: u64,
	pub rms_error: f64,
	pub abs_error: f64,
	/// The mean of the true values with this label.
	pub mean: f64,
	/// The population standard deviation of the true values with this label.
	pub std: f64,
}

/**
Break attribute errors down by true label. `labels[i]` is the true label of the pair `(predictions[i], truths[i])`. Pairs with a `NaN` on either side are skipped, labels are reported in lexical order, and labels without any usable pair are left out.
*/
pub fn error_by_label<S>(predictions: &[f64], truths: &[f64], labels: &[S]) -> Vec<LabelErrorMetrics>
where
	S: AsRef<str>,
{
	labels
		.iter()
		.map(|label| label.as_ref())
		.unique()
		.sorted()
		.filter_map(|label| {
			let mut metrics = RegressionMetrics::new();
			for ((prediction, truth), value) in predictions.iter().zip(truths).zip(labels) {
				if value.as_ref() == label {
					metrics.update((*prediction, *truth));
				}
			}
			let output = metrics.finalize();
			if output.n == 0 {
				return None;
			}
			Some(LabelErrorMetrics {
				label: label.to_owned(),
				count: output.n,
				rms_error: output.rmse,
				abs_error: output.mae,
				mean: output.label_mean,
				std: output.label_std,
			})
		})
		.collect()
}

#[test]
fn test_regression_metrics() {
	let mut metrics = RegressionMetrics::new();
	metrics.update((12.0, 10.0));
	metrics.update((f64::NAN, 20.0));
	let mut other = RegressionMetrics::new();
	other.update((16.0, 20.0));
	other.update((30.0, f64::NAN));
	metrics.merge(other);
	let output = metrics.finalize();
	assert_eq!(output.n, 2);
	assert_eq!(output.mae, 3.0);
	assert_eq!(output.mse, 10.0);
	assert_eq!(output.label_mean, 15.0);
	assert_eq!(output.label_std, 5.0);
}

#[test]
fn test_rms_and_abs_error() {
	let a = [1.0, 2.0, 3.0, 4.0];
	let b = [2.0, 2.0, 3.0, 1.0];
	assert!((rms_error(&a, &b) - (10.0f64 / 4.0).sqrt()).abs() < 1e-12);
	assert_eq!(mean_absolute_error(&a, &b), 1.0);
	assert!(rms_error(&[], &[]).is_nan());
}

#[test]
fn test_error_by_label() {
	let predictions = [10.0, 30.0, 50.0, 7.0, 1.0];
	let truths = [12.0, 30.0, 40.0, f64::NAN, 2.0];
	let labels = ["trawlers", "cargo", "cargo", "tug", "trawlers"];
	let rows = error_by_label(&predictions, &truths, &labels);
	let labels: Vec<&str> = rows.iter().map(|row| row.label.as_str()).collect();
	assert_eq!(labels, vec!["cargo", "trawlers"]);
	assert_eq!(rows[0].count, 2);
	assert_eq!(rows[0].abs_error, 5.0);
	assert_eq!(rows[0].mean, 35.0);
	assert_eq!(rows[0].std, 5.0);
	assert_eq!(rows[1].count, 2);
	assert_eq!(rows[1].abs_error, 1.5);
}

use super::{mean::Mean, StreamingMetric};

/// The accuracy is the proportion of examples where prediction == label.
#[derive(Clone, Debug, Default)]
pub struct Accuracy(Mean);

impl Accuracy {
	pub fn new() -> Self {
		Self::default()
	}
}

impl<'a> StreamingMetric<'a> for Accuracy {
	/// (label, prediction)
	type Input = (&'a str, &'a str);
	type Output = Option<f64>;

	fn update(&mut self, value: Self::Input) {
		self.0.update(if value.0 == value.1 { 1.0 } else { 0.0 })
	}

	fn merge(&mut self, other: Self) {
		self.0.merge(other.0)
	}

	fn finalize(self) -> Option<f64> {
		self.0.finalize()
	}
}

/**
Compute the weighted fraction of examples where `y_pred[i] == y_true[i]`.

With `weights` of `None` every example has weight one. Pass the output of [`balanced_weights`](fn.balanced_weights.html) to give every true class equal total weight. The result is `NaN` when the weights sum to zero.
*/
pub fn accuracy_score<T>(y_true: &[T], y_pred: &[T], weights: Option<&[f64]>) -> f64
where
	T: PartialEq,
{
	let mut correct = 0.0;
	let mut total = 0.0;
	for (index, (label, prediction)) in y_true.iter().zip(y_pred.iter()).enumerate() {
		let weight = weights.map(|weights| weights[index]).unwrap_or(1.0);
		if label == prediction {
			correct += weight;
		}
		total += weight;
	}
	correct / total
}

#[test]
fn test_accuracy_score() {
	let y_true = ["fishing", "fishing", "non_fishing"];
	let y_pred = ["fishing", "non_fishing", "non_fishing"];
	assert!((accuracy_score(&y_true, &y_pred, None) - 2.0 / 3.0).abs() < 1e-12);
	let weights = [0.0, 1.0, 1.0];
	assert!((accuracy_score(&y_true, &y_pred, Some(&weights)) - 0.5).abs() < 1e-12);
	assert!(accuracy_score::<&str>(&[], &[], None).is_nan());
}

#[test]
fn test_streaming_accuracy() {
	let mut accuracy = Accuracy::new();
	accuracy.update(("trawlers", "trawlers"));
	accuracy.update(("trawlers", "squid_jigger"));
	let mut other = Accuracy::new();
	other.update(("tug", "tug"));
	other.update(("tug", "tug"));
	accuracy.merge(other);
	assert_eq!(accuracy.finalize(), Some(0.75));
}

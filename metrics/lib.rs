/*!
This crate defines the [`Metric`](trait.Metric.html) and [`StreamingMetric`](trait.StreamingMetric.html) traits and the metrics used to score a vessel classifier against ground truth: [`Accuracy`](struct.Accuracy.html), binary precision and recall, balanced class weights, the [`ConfusionMatrix`](struct.ConfusionMatrix.html) and the RMS / absolute error statistics used for continuous vessel attributes.

Empty denominators are never an error here. Precision with no positive predictions, recall with no positive labels and the means of empty inputs all come back as `NaN`, and callers decide how to display them.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod accuracy;
mod binary_classification;
mod class_weights;
mod classification;
mod confusion_matrix;
mod mean;
mod mean_variance;
mod regression;

pub use self::accuracy::{accuracy_score, Accuracy};
pub use self::binary_classification::{
	f1_score, precision_score, recall_score, BinaryClassificationMetrics,
	BinaryClassificationMetricsOutput,
};
pub use self::class_weights::{balanced_weights, DEFAULT_MAX_WEIGHT};
pub use self::classification::{precision_recall_f1, ClassMetrics};
pub use self::confusion_matrix::{
	base_confusion_matrix, harmonic_mean, ConfusionMatrix, ConfusionMatrixInput, EPS,
};
pub use self::mean::Mean;
pub use self::mean_variance::{m2_to_variance, merge_mean_m2};
pub use self::regression::{
	error_by_label, mean_absolute_error, rms_error, LabelErrorMetrics, RegressionMetrics,
	RegressionMetricsOutput,
};

/**
The `Metric` trait defines a common interface to metrics that can be computed when the entire input is available at once.

The seemingly unused generic lifetime `'a` exists here to allow `Input`s and `Output`s to borrow from their enclosing scope.
*/
pub trait Metric<'a> {
	type Input;
	type Output;
	fn compute(input: Self::Input) -> Self::Output;
}

/**
The `StreamingMetric` trait defines a common interface to metrics that can be computed in a streaming manner, where the input arrives one value at a time, such as accuracy over the minutes of a fishing timeline.

After being initialized, a value of type `T` implementing the `StreamingMetric` trait can have `update()` called on it with values of the associated type `Input`. Multiple values of `T` can be merged together by calling `merge()`, which is how per-vessel accumulators are pooled into per-category and overall statistics. When finished aggregating, call `finalize()` on the metric to produce the associated type `Output`.

# Examples

Here is a basic example implementation of a `Min` metric, which takes `f64`s as input and produces an `f64` as output that is the minimum of all the inputs.

```
use vessel_eval_metrics::StreamingMetric;

struct Min(f64);

impl StreamingMetric<'_> for Min {
	type Input = f64;
	type Output = f64;
	fn update(&mut self, input: Self::Input) {
		self.0 = self.0.min(input)
	}
	fn merge(&mut self, other: Self) { self.0 = self.0.min(other.0) }
	fn finalize(self) -> Self::Output { self.0 }
}
```
*/
pub trait StreamingMetric<'a> {
	/// `Input` is the type to aggregate in calls to `update()`.
	type Input;
	/// `Output` is the return type of `finalize()`.
	type Output;
	/// Update this streaming metric with the `Input` `input`.
	fn update(&mut self, input: Self::Input);
	/// Merge multiple independently computed streaming metrics.
	fn merge(&mut self, other: Self);
	/// When you are done aggregating `Input`s, call `finalize()` to produce an `Output`.
	fn finalize(self) -> Self::Output;
}

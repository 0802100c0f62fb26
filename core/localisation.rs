/*!
Fishing localisation compares, minute by minute, the fishing activity the model predicted for a vessel with the annotated fishing ranges of that vessel.

For each annotated vessel a dense grid covering every minute of its annotated span is built, one column for the truth and one for the prediction, every cell starting out unknown. Annotated ranges fill the truth column, later ranges overwriting earlier ones. Every span the model looked at fills the prediction column with "not fishing", and every predicted fishing interval then overwrites it with "fishing". Only the minutes known in both columns are compared.
*/

use crate::{
	extract::FishingRangeResults,
	ground_truth::{TrueFishingRanges, TrueRange},
	record::Interval,
	taxonomy::{gear_categories, gear_category},
	time::minute_of,
};
use ndarray::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};
use vessel_eval_metrics::{
	BinaryClassificationMetrics, BinaryClassificationMetricsOutput, StreamingMetric,
};

/// The value of a grid cell nothing has been written to.
pub const UNKNOWN: i8 = -1;

/// A per-minute grid over the annotated span of one vessel, one row per minute.
pub(crate) struct MinuteGrid<T> {
	start_minute: i64,
	pub(crate) values: Array2<T>,
}

impl<T> MinuteGrid<T>
where
	T: Copy,
{
	/// A grid spanning every annotated range, or `None` without ranges.
	pub(crate) fn spanning<V>(
		ranges: &[TrueRange<V>],
		n_columns: usize,
		unknown: T,
	) -> Option<Self> {
		let start = ranges.iter().map(|range| range.interval.start).min()?;
		let end = ranges.iter().map(|range| range.interval.end).max()?;
		let start_minute = minute_of(&start);
		let n_minutes = (minute_of(&end) - start_minute + 1).max(0) as usize;
		Some(MinuteGrid {
			start_minute,
			values: Array2::from_elem((n_minutes, n_columns), unknown),
		})
	}

	/// Write `value` to `column` for every minute of `interval`, both ends included. Minutes outside the grid are ignored.
	pub(crate) fn fill(&mut self, interval: &Interval, column: usize, value: T) {
		let n_minutes = self.values.nrows() as i64;
		let first = (minute_of(&interval.start) - self.start_minute).max(0);
		let last = (minute_of(&interval.end) - self.start_minute).min(n_minutes - 1);
		for minute in first..=last {
			self.values[[minute as usize, column]] = value;
		}
	}

	/// Mark `column` as "not fishing" wherever the model had coverage, then as "fishing" inside predicted ranges.
	pub(crate) fn fill_predictions(
		&mut self,
		predictions: &FishingRangeResults,
		mmsi: &str,
		column: usize,
		not_fishing: T,
		fishing: T,
	) {
		for interval in predictions.coverage(mmsi) {
			self.fill(interval, column, not_fishing);
		}
		for interval in predictions.ranges(mmsi) {
			self.fill(interval, column, fishing);
		}
	}
}

/// The masked timelines of every compared vessel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalisationResults {
	pub true_fishing_by_mmsi: BTreeMap<String, Vec<bool>>,
	pub pred_fishing_by_mmsi: BTreeMap<String, Vec<bool>>,
}

impl LocalisationResults {
	pub fn is_empty(&self) -> bool {
		self.true_fishing_by_mmsi.is_empty()
	}

	/// Pointwise metrics of one vessel, or `None` if it was not compared.
	pub fn vessel_metrics(&self, mmsi: &str) -> Option<BinaryClassificationMetrics> {
		let y_true = self.true_fishing_by_mmsi.get(mmsi)?;
		let y_pred = self.pred_fishing_by_mmsi.get(mmsi)?;
		let mut metrics = BinaryClassificationMetrics::new();
		for (label, prediction) in y_true.iter().zip(y_pred.iter()) {
			metrics.update((*label, *prediction));
		}
		Some(metrics)
	}
}

/**
Compare predicted fishing with annotated fishing for every annotated vessel, in lexical order. Vessels with no minute known on both sides are left out of the results.
*/
pub fn compare_fishing_localisation(
	predictions: &FishingRangeResults,
	truth: &TrueFishingRanges<bool>,
) -> LocalisationResults {
	let mut results = LocalisationResults::default();
	for (mmsi, true_ranges) in truth.ranges_by_mmsi.iter() {
		let mut grid = match MinuteGrid::spanning(true_ranges, 2, UNKNOWN) {
			Some(grid) => grid,
			None => continue,
		};
		debug!("comparing {} true ranges of {}", true_ranges.len(), mmsi);
		for range in true_ranges.iter() {
			grid.fill(&range.interval, 0, range.value as i8);
		}
		grid.fill_predictions(predictions, mmsi, 1, 0, 1);
		let (y_true, y_pred): (Vec<bool>, Vec<bool>) = grid
			.values
			.genrows()
			.into_iter()
			.filter(|minute| minute[0] != UNKNOWN && minute[1] != UNKNOWN)
			.map(|minute| (minute[0] == 1, minute[1] == 1))
			.unzip();
		if y_true.is_empty() {
			continue;
		}
		let n_correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
		debug!(
			"accuracy for {}: {}",
			mmsi,
			n_correct as f64 / y_true.len() as f64
		);
		results.true_fishing_by_mmsi.insert(mmsi.clone(), y_true);
		results.pred_fishing_by_mmsi.insert(mmsi.clone(), y_pred);
	}
	results
}

/// One row of the localisation report.
#[derive(Clone, Debug, PartialEq)]
pub struct GearLocalisation {
	pub category: String,
	pub n_vessels: usize,
	pub n_fishing_minutes: u64,
	pub n_minutes: u64,
	pub precision: f64,
	pub recall: f64,
	pub accuracy: f64,
	pub f1_score: f64,
}

impl GearLocalisation {
	fn new(category: &str, n_vessels: usize, output: BinaryClassificationMetricsOutput) -> Self {
		GearLocalisation {
			category: category.to_owned(),
			n_vessels,
			n_fishing_minutes: output.n_positive_labels,
			n_minutes: output.n_examples,
			precision: output.precision,
			recall: output.recall,
			accuracy: output.accuracy,
			f1_score: output.f1_score,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocalisationReport {
	/// Gear categories in report order. Categories without compared vessels are left out.
	pub by_gear: Vec<GearLocalisation>,
	/// Every compared vessel, labeled or not.
	pub overall: GearLocalisation,
}

/**
Pool the compared vessels per gear category of their true label. Vessels without a label only count toward the overall row.
*/
pub fn localisation_report(
	results: &LocalisationResults,
	label_map: &BTreeMap<String, String>,
) -> LocalisationReport {
	let mut overall = BinaryClassificationMetrics::new();
	for mmsi in results.true_fishing_by_mmsi.keys() {
		if let Some(metrics) = results.vessel_metrics(mmsi) {
			overall.merge(metrics);
		}
	}
	let overall = GearLocalisation::new(
		"Overall",
		results.true_fishing_by_mmsi.len(),
		overall.finalize(),
	);
	info!("overall localisation accuracy {}", overall.accuracy);
	info!("overall localisation precision {}", overall.precision);
	info!("overall localisation recall {}", overall.recall);

	let mut by_gear = Vec::new();
	for category in gear_categories() {
		let mut metrics = BinaryClassificationMetrics::new();
		let mut vessels = Vec::new();
		for (mmsi, label) in label_map.iter() {
			if gear_category(label) != category {
				continue;
			}
			if let Some(vessel_metrics) = results.vessel_metrics(mmsi) {
				metrics.merge(vessel_metrics);
				vessels.push(mmsi.as_str());
			}
		}
		if vessels.is_empty() {
			continue;
		}
		info!("vessels for {}: {:?}", category, vessels);
		by_gear.push(GearLocalisation::new(category, vessels.len(), metrics.finalize()));
	}
	LocalisationReport { by_gear, overall }
}

#[cfg(test)]
fn interval(start: &str, end: &str) -> Interval {
	use crate::time::parse_timestamp;
	Interval {
		start: parse_timestamp(start).unwrap(),
		end: parse_timestamp(end).unwrap(),
	}
}

#[test]
fn test_interval_fill() {
	// Fishing annotated for minutes 0 to 9, coverage over minutes 0 to 19, fishing predicted for minutes 5 to 14.
	let truth = TrueFishingRanges {
		ranges_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![TrueRange {
				value: true,
				interval: interval("2015-03-01T00:00:00", "2015-03-01T00:09:00"),
			}],
		},
	};
	let predictions = FishingRangeResults {
		ranges_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![interval("2015-03-01T00:05:00", "2015-03-01T00:14:00")],
		},
		coverage_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![interval("2015-03-01T00:00:00", "2015-03-01T00:19:59")],
		},
	};
	let results = compare_fishing_localisation(&predictions, &truth);
	let y_true = &results.true_fishing_by_mmsi["1"];
	let y_pred = &results.pred_fishing_by_mmsi["1"];
	// Minutes 10 to 19 lie outside the annotated span.
	assert_eq!(y_true.len(), 10);
	assert!(y_true.iter().all(|&fishing| fishing));
	assert_eq!(&y_pred[..5], &[false; 5]);
	assert_eq!(&y_pred[5..], &[true; 5]);
	let output = results.vessel_metrics("1").unwrap().finalize();
	assert_eq!(output.accuracy, 0.5);
	assert_eq!(output.precision, 1.0);
	assert_eq!(output.recall, 0.5);
}

#[test]
fn test_last_write_wins_and_no_coverage() {
	let truth = TrueFishingRanges {
		ranges_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![
				TrueRange { value: true, interval: interval("2015-03-01T00:00:00", "2015-03-01T00:03:00") },
				TrueRange { value: false, interval: interval("2015-03-01T00:02:00", "2015-03-01T00:05:00") },
			],
			"2".to_owned() => vec![
				TrueRange { value: true, interval: interval("2015-03-01T00:00:00", "2015-03-01T00:03:00") },
			],
		},
	};
	let predictions = FishingRangeResults {
		ranges_by_mmsi: BTreeMap::new(),
		coverage_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![interval("2015-02-28T23:00:00", "2015-03-01T01:00:00")],
		},
	};
	let results = compare_fishing_localisation(&predictions, &truth);
	// A vessel the model never looked at is not compared.
	assert_eq!(results.true_fishing_by_mmsi.keys().collect::<Vec<_>>(), vec!["1"]);
	assert_eq!(
		results.true_fishing_by_mmsi["1"],
		vec![true, true, false, false, false, false]
	);
	assert_eq!(results.pred_fishing_by_mmsi["1"], vec![false; 6]);
}

#[test]
fn test_localisation_report() {
	let results = LocalisationResults {
		true_fishing_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![true, true, false, false],
			"2".to_owned() => vec![true, false],
			"3".to_owned() => vec![true],
			"4".to_owned() => vec![false],
		},
		pred_fishing_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![true, false, false, true],
			"2".to_owned() => vec![true, false],
			"3".to_owned() => vec![true],
			"4".to_owned() => vec![false],
		},
	};
	let label_map = maplit::btreemap! {
		"1".to_owned() => "set_gillnets".to_owned(),
		"2".to_owned() => "pots_and_traps".to_owned(),
		"3".to_owned() => "squid_jigger".to_owned(),
	};
	let report = localisation_report(&results, &label_map);
	let categories: Vec<&str> = report.by_gear.iter().map(|row| row.category.as_str()).collect();
	assert_eq!(categories, vec!["stationary_gear", "other"]);
	let stationary = &report.by_gear[0];
	assert_eq!(stationary.n_vessels, 2);
	assert_eq!(stationary.n_fishing_minutes, 3);
	assert_eq!(stationary.n_minutes, 6);
	assert!((stationary.accuracy - 4.0 / 6.0).abs() < 1e-12);
	assert!((stationary.precision - 2.0 / 3.0).abs() < 1e-12);
	assert!((stationary.recall - 2.0 / 3.0).abs() < 1e-12);
	assert_eq!(report.overall.n_vessels, 4);
	assert_eq!(report.overall.n_minutes, 8);
	assert!((report.overall.accuracy - 6.0 / 8.0).abs() < 1e-12);
}

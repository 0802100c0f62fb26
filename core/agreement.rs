/*!
Agreement between the model and multiple human raters over annotated fishing ranges.

Each annotated range carries a packed value: `floor(1000 v)` raters called the range fishing, out of `round(frac(1000 v) * 1000)` raters in total. The packing cannot represent 1000 or more raters, since the total wraps around. For every minute known on both sides this computes how many raters the model agrees with, and how many ordered pairs of raters agree with each other.
*/

use crate::{
	error::{Error, Result},
	extract::FishingRangeResults,
	ground_truth::TrueFishingRanges,
	localisation::MinuteGrid,
};
use tracing::{debug, info};

/// A packed `(fishing raters, total raters)` count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackedAgreement(pub f64);

/// Rater counts of one annotated range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaterCounts {
	pub n_fishing: f64,
	pub n_total: f64,
}

impl RaterCounts {
	pub fn n_not_fishing(&self) -> f64 {
		self.n_total - self.n_fishing
	}
}

impl PackedAgreement {
	pub fn decode(self) -> RaterCounts {
		let shifted = 1000.0 * self.0;
		RaterCounts {
			n_fishing: shifted.floor(),
			n_total: (shifted.rem_euclid(1.0) * 1000.0).round(),
		}
	}
}

/// Sums over every compared minute of every vessel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgreementReport {
	/// Raters agreeing with the model's prediction.
	pub model_agreement: f64,
	/// Raters asked.
	pub rater_count: f64,
	/// Ordered pairs of raters that agree.
	pub human_agreement: f64,
	/// Ordered pairs of raters.
	pub human_pairs: f64,
	pub n_minutes: u64,
}

impl AgreementReport {
	/// The fraction of rater verdicts the model agrees with. `None` without raters.
	pub fn model_agreement_ratio(&self) -> Option<f64> {
		ratio(self.model_agreement, self.rater_count)
	}

	/// The fraction of rater pairs that agree. `None` without pairs.
	pub fn human_agreement_ratio(&self) -> Option<f64> {
		ratio(self.human_agreement, self.human_pairs)
	}
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
	if denominator == 0.0 {
		None
	} else {
		Some(numerator / denominator)
	}
}

const N_FISHING: usize = 0;
const N_TOTAL: usize = 1;
const PREDICTION: usize = 2;

/**
Compare the model with the raters of every annotated vessel, in lexical order. A decoded range with more agreeing raters or pairs than it has raters is an [`Error::InconsistentAgreement`](enum.Error.html).
*/
pub fn compute_fishing_range_agreement(
	predictions: &FishingRangeResults,
	truth: &TrueFishingRanges<PackedAgreement>,
) -> Result<AgreementReport> {
	let mut report = AgreementReport::default();
	for (mmsi, true_ranges) in truth.ranges_by_mmsi.iter() {
		let mut grid = match MinuteGrid::spanning(true_ranges, 3, -1.0) {
			Some(grid) => grid,
			None => continue,
		};
		debug!("comparing {} agreement ranges of {}", true_ranges.len(), mmsi);
		for range in true_ranges.iter() {
			let counts = range.value.decode();
			grid.fill(&range.interval, N_FISHING, counts.n_fishing);
			grid.fill(&range.interval, N_TOTAL, counts.n_total);
		}
		grid.fill_predictions(predictions, mmsi, PREDICTION, 0.0, 1.0);
		for minute in grid.values.genrows() {
			if minute[N_FISHING] == -1.0 || minute[PREDICTION] == -1.0 {
				continue;
			}
			let counts = RaterCounts {
				n_fishing: minute[N_FISHING],
				n_total: minute[N_TOTAL],
			};
			let prediction = minute[PREDICTION];
			let matches =
				prediction * counts.n_fishing + (1.0 - prediction) * counts.n_not_fishing();
			let n = counts.n_total;
			let a = counts.n_fishing;
			let b = counts.n_not_fishing();
			let realized = a * (a - 1.0) + b * (b - 1.0);
			let possible = n * (n - 1.0);
			if matches > n {
				return Err(Error::InconsistentAgreement {
					mmsi: mmsi.clone(),
					realized: matches,
					possible: n,
				});
			}
			if realized > possible {
				return Err(Error::InconsistentAgreement {
					mmsi: mmsi.clone(),
					realized,
					possible,
				});
			}
			report.model_agreement += matches;
			report.rater_count += n;
			report.human_agreement += realized;
			report.human_pairs += possible;
			report.n_minutes += 1;
		}
	}
	match report.model_agreement_ratio() {
		Some(ratio) => info!("model agreement with humans over predicted ranges: {}", ratio),
		None => info!("no rater verdicts over predicted ranges"),
	}
	if let Some(ratio) = report.human_agreement_ratio() {
		info!("human agreement over predicted ranges: {}", ratio);
	}
	Ok(report)
}

#[test]
fn test_decode() {
	assert_eq!(
		PackedAgreement(0.002003).decode(),
		RaterCounts {
			n_fishing: 2.0,
			n_total: 3.0
		}
	);
	assert_eq!(
		PackedAgreement(0.0).decode(),
		RaterCounts {
			n_fishing: 0.0,
			n_total: 0.0
		}
	);
	let counts = PackedAgreement(0.005005).decode();
	assert_eq!(counts.n_fishing, 5.0);
	assert_eq!(counts.n_total, 5.0);
	assert_eq!(counts.n_not_fishing(), 0.0);
}

#[cfg(test)]
fn agreement_fixture(value: f64) -> (FishingRangeResults, TrueFishingRanges<PackedAgreement>) {
	use crate::{ground_truth::TrueRange, record::Interval, time::parse_timestamp};
	let interval = |start: &str, end: &str| Interval {
		start: parse_timestamp(start).unwrap(),
		end: parse_timestamp(end).unwrap(),
	};
	let truth = TrueFishingRanges {
		ranges_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![TrueRange {
				value: PackedAgreement(value),
				interval: interval("2015-03-01T00:00:00", "2015-03-01T00:09:00"),
			}],
		},
	};
	let predictions = FishingRangeResults {
		ranges_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![interval("2015-03-01T00:00:00", "2015-03-01T00:04:00")],
		},
		coverage_by_mmsi: maplit::btreemap! {
			"1".to_owned() => vec![interval("2015-03-01T00:00:00", "2015-03-01T00:09:00")],
		},
	};
	(predictions, truth)
}

#[test]
fn test_compute_fishing_range_agreement() {
	// Two of three raters called minutes 0 to 9 fishing. The model predicts fishing for minutes 0 to 4.
	let (predictions, truth) = agreement_fixture(0.002003);
	let report = compute_fishing_range_agreement(&predictions, &truth).unwrap();
	assert_eq!(report.n_minutes, 10);
	assert_eq!(report.model_agreement, 15.0);
	assert_eq!(report.rater_count, 30.0);
	assert_eq!(report.model_agreement_ratio(), Some(0.5));
	assert_eq!(report.human_agreement, 20.0);
	assert_eq!(report.human_pairs, 60.0);
	assert!((report.human_agreement_ratio().unwrap() - 1.0 / 3.0).abs() < 1e-12);
	assert!(report.human_agreement <= report.human_pairs);
}

#[test]
fn test_inconsistent_agreement() {
	// Four fishing raters out of three.
	let (predictions, truth) = agreement_fixture(0.004003);
	let result = compute_fishing_range_agreement(&predictions, &truth);
	assert!(matches!(result, Err(Error::InconsistentAgreement { .. })));
}

#[test]
fn test_empty_agreement() {
	let report =
		compute_fishing_range_agreement(&FishingRangeResults::default(), &TrueFishingRanges {
			ranges_by_mmsi: Default::default(),
		})
		.unwrap();
	assert_eq!(report.model_agreement_ratio(), None);
	assert_eq!(report.human_agreement_ratio(), None);
}

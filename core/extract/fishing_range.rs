use super::Extractor;
use crate::record::{InferenceRecord, Interval};
use std::collections::BTreeMap;

/**
Predicted fishing activity per vessel. `ranges_by_mmsi` holds the intervals the model flagged as fishing. `coverage_by_mmsi` holds the span of every record that carried a fishing block, which separates "predicted not fishing" from "no prediction".
*/
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FishingRangeResults {
	pub ranges_by_mmsi: BTreeMap<String, Vec<Interval>>,
	pub coverage_by_mmsi: BTreeMap<String, Vec<Interval>>,
}

impl FishingRangeResults {
	pub fn is_empty(&self) -> bool {
		self.coverage_by_mmsi.is_empty()
	}

	pub fn ranges(&self, mmsi: &str) -> &[Interval] {
		self.ranges_by_mmsi
			.get(mmsi)
			.map(|ranges| ranges.as_slice())
			.unwrap_or(&[])
	}

	pub fn coverage(&self, mmsi: &str) -> &[Interval] {
		self.coverage_by_mmsi
			.get(mmsi)
			.map(|coverage| coverage.as_slice())
			.unwrap_or(&[])
	}
}

#[derive(Default)]
pub struct FishingRangeExtractor {
	results: FishingRangeResults,
}

impl FishingRangeExtractor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn finalize(self) -> FishingRangeResults {
		self.results
	}
}

impl Extractor for FishingRangeExtractor {
	fn extract(&mut self, record: &InferenceRecord) {
		let fishing = match &record.fishing {
			Some(fishing) => fishing,
			None => return,
		};
		self.results
			.ranges_by_mmsi
			.entry(record.mmsi.clone())
			.or_default()
			.extend(
				fishing
					.intervals
					.iter()
					.filter(|interval| interval.is_fishing)
					.map(|interval| interval.interval),
			);
		self.results
			.coverage_by_mmsi
			.entry(record.mmsi.clone())
			.or_default()
			.push(fishing.coverage);
	}
}

#[test]
fn test_fishing_range_extractor() {
	let record = InferenceRecord::from_json_str(
		r#"{
			"mmsi": "7",
			"start_time": "2015-01-01T00:00:00Z",
			"end_time": "2015-01-02T00:00:00Z",
			"fishing_localisation": [
				{"start_time": "2015-01-01T01:00:00Z", "end_time": "2015-01-01T02:00:00Z", "value": true},
				{"start_time": "2015-01-01T03:00:00Z", "end_time": "2015-01-01T04:00:00Z", "value": false}
			]
		}"#,
	)
	.unwrap();
	let mut extractor = FishingRangeExtractor::new();
	extractor.extract(&record);
	let mut without_block = record.clone();
	without_block.mmsi = "8".to_owned();
	without_block.fishing = None;
	extractor.extract(&without_block);
	let results = extractor.finalize();
	assert_eq!(results.ranges("7").len(), 1);
	assert_eq!(results.ranges("7")[0], record.fishing.as_ref().unwrap().intervals[0].interval);
	assert_eq!(results.coverage("7").len(), 1);
	assert!(results.coverage("8").is_empty());
	assert!(results.ranges("8").is_empty());
}

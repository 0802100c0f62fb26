/*!
Ground truth tables keyed by vessel identifier: vessel labels, vessel attributes and per-interval fishing annotations. Only rows tagged with the test split marker are eligible.
*/

use crate::{
	agreement::PackedAgreement,
	error::{Error, Result},
	record::Interval,
	taxonomy::Taxonomy,
	time::parse_timestamp,
};
use std::collections::{BTreeMap, BTreeSet};

/// One row of a ground truth table, column name to raw cell text.
pub type RawRow = BTreeMap<String, String>;

pub const DEFAULT_TEST_SPLIT: &str = "Test";

pub const DEFAULT_ATTRIBUTES: &[&str] = &["length", "tonnage", "engine_power", "crew_size"];

#[derive(Clone, Debug, Default)]
pub struct GroundTruth {
	labels: BTreeMap<String, String>,
	attributes: BTreeMap<String, BTreeMap<String, f64>>,
	splits: BTreeMap<String, String>,
}

impl GroundTruth {
	/**
	Build the ground truth from vessel rows. Rows whose `split` is not `test_split` are dropped. A label is kept only if it belongs to the fine vocabulary of `taxonomy`. Non-empty `attribute_fields` cells must parse as positive numbers.
	*/
	pub fn from_rows<I, S>(
		rows: I,
		taxonomy: &Taxonomy,
		test_split: &str,
		attribute_fields: &[S],
	) -> Result<GroundTruth>
	where
		I: IntoIterator<Item = RawRow>,
		S: AsRef<str>,
	{
		let mut ground_truth = GroundTruth::default();
		for row in rows {
			let mmsi = required(&row, "mmsi")?.trim().to_owned();
			let split = required(&row, "split")?;
			if split != test_split {
				continue;
			}
			ground_truth.splits.insert(mmsi.clone(), split.to_owned());
			if let Some(label) = non_empty(&row, "label") {
				let label = label.trim();
				if taxonomy.contains(label) {
					ground_truth.labels.insert(mmsi.clone(), label.to_owned());
				}
			}
			for field in attribute_fields.iter().map(|field| field.as_ref()) {
				let value = match non_empty(&row, field) {
					Some(value) => value,
					None => continue,
				};
				let invalid = || Error::InvalidAttribute {
					field: field.to_owned(),
					mmsi: mmsi.clone(),
					value: value.to_owned(),
				};
				let parsed: f64 = value.trim().parse().map_err(|_| invalid())?;
				if !(parsed > 0.0) {
					return Err(invalid());
				}
				ground_truth
					.attributes
					.entry(field.to_owned())
					.or_default()
					.insert(mmsi.clone(), parsed);
			}
		}
		Ok(ground_truth)
	}

	/// Read vessel rows from a csv with a header row.
	pub fn from_csv<R, S>(
		reader: R,
		taxonomy: &Taxonomy,
		test_split: &str,
		attribute_fields: &[S],
	) -> Result<GroundTruth>
	where
		R: std::io::Read,
		S: AsRef<str>,
	{
		let rows = read_csv_rows(reader)?;
		GroundTruth::from_rows(rows, taxonomy, test_split, attribute_fields)
	}

	pub fn label(&self, mmsi: &str) -> Option<&str> {
		self.labels.get(mmsi).map(|label| label.as_str())
	}

	/// Vessel identifier to fine label.
	pub fn labels(&self) -> &BTreeMap<String, String> {
		&self.labels
	}

	/// Vessel identifier to attribute value. Empty if no vessel has the attribute.
	pub fn attribute(&self, field: &str) -> BTreeMap<String, f64> {
		self.attributes.get(field).cloned().unwrap_or_default()
	}

	pub fn is_test(&self, mmsi: &str) -> bool {
		self.splits.contains_key(mmsi)
	}

	/// Every vessel with a test split row, for restricting the inference stream.
	pub fn allow_list(&self) -> BTreeSet<String> {
		self.splits.keys().cloned().collect()
	}
}

pub(crate) fn read_csv_rows<R>(reader: R) -> Result<Vec<RawRow>>
where
	R: std::io::Read,
{
	let mut reader = csv::Reader::from_reader(reader);
	let mut rows = Vec::new();
	for row in reader.deserialize() {
		rows.push(row?);
	}
	Ok(rows)
}

fn required<'a>(row: &'a RawRow, field: &str) -> Result<&'a str> {
	row.get(field)
		.map(|value| value.as_str())
		.ok_or_else(|| Error::MissingField(field.to_owned()))
}

fn non_empty<'a>(row: &'a RawRow, field: &str) -> Option<&'a str> {
	row.get(field)
		.map(|value| value.as_str())
		.filter(|value| !value.is_empty())
}

/// One annotated span of a vessel's track.
#[derive(Clone, Debug, PartialEq)]
pub struct TrueRange<V> {
	pub value: V,
	pub interval: Interval,
}

/// Annotated fishing ranges of test split vessels, in row order per vessel.
#[derive(Clone, Debug, PartialEq)]
pub struct TrueFishingRanges<V> {
	pub ranges_by_mmsi: BTreeMap<String, Vec<TrueRange<V>>>,
}

impl<V> TrueFishingRanges<V> {
	fn from_rows<I>(
		rows: I,
		ground_truth: &GroundTruth,
		decode: impl Fn(f64) -> V,
	) -> Result<TrueFishingRanges<V>>
	where
		I: IntoIterator<Item = RawRow>,
	{
		let mut ranges_by_mmsi: BTreeMap<String, Vec<TrueRange<V>>> = BTreeMap::new();
		for row in rows {
			let mmsi = required(&row, "mmsi")?.trim();
			if !ground_truth.is_test(mmsi) {
				continue;
			}
			let raw_value = required(&row, "is_fishing")?;
			let value: f64 = raw_value.trim().parse().map_err(|_| Error::InvalidAttribute {
				field: "is_fishing".to_owned(),
				mmsi: mmsi.to_owned(),
				value: raw_value.to_owned(),
			})?;
			let interval = Interval {
				start: parse_timestamp(required(&row, "start_time")?)?,
				end: parse_timestamp(required(&row, "end_time")?)?,
			};
			ranges_by_mmsi
				.entry(mmsi.to_owned())
				.or_default()
				.push(TrueRange {
					value: decode(value),
					interval,
				});
		}
		Ok(TrueFishingRanges { ranges_by_mmsi })
	}

	pub fn is_empty(&self) -> bool {
		self.ranges_by_mmsi.is_empty()
	}
}

impl TrueFishingRanges<bool> {
	/// Binary annotations: a range is fishing when its `is_fishing` value exceeds one half.
	pub fn binary_from_rows<I>(rows: I, ground_truth: &GroundTruth) -> Result<Self>
	where
		I: IntoIterator<Item = RawRow>,
	{
		TrueFishingRanges::from_rows(rows, ground_truth, |value| value > 0.5)
	}

	pub fn binary_from_csv<R>(reader: R, ground_truth: &GroundTruth) -> Result<Self>
	where
		R: std::io::Read,
	{
		TrueFishingRanges::binary_from_rows(read_csv_rows(reader)?, ground_truth)
	}
}

impl TrueFishingRanges<PackedAgreement> {
	/// Multi-rater annotations: `is_fishing` holds a packed rater count.
	pub fn agreement_from_rows<I>(rows: I, ground_truth: &GroundTruth) -> Result<Self>
	where
		I: IntoIterator<Item = RawRow>,
	{
		TrueFishingRanges::from_rows(rows, ground_truth, PackedAgreement)
	}

	pub fn agreement_from_csv<R>(reader: R, ground_truth: &GroundTruth) -> Result<Self>
	where
		R: std::io::Read,
	{
		TrueFishingRanges::agreement_from_rows(read_csv_rows(reader)?, ground_truth)
	}
}

#[cfg(test)]
const VESSELS_CSV: &str = "\
mmsi,label,length,tonnage,engine_power,crew_size,split
1, trawlers ,30.5,,,,Test
2,tug,20,100,,,Training
3,mystery_boat,12,,,,Test
4,,45,,,8,Test
";

#[test]
fn test_ground_truth_from_csv() {
	let taxonomy = Taxonomy::builtin();
	let ground_truth = GroundTruth::from_csv(
		VESSELS_CSV.as_bytes(),
		&taxonomy,
		DEFAULT_TEST_SPLIT,
		DEFAULT_ATTRIBUTES,
	)
	.unwrap();
	assert_eq!(ground_truth.label("1"), Some("trawlers"));
	// Training rows are not eligible.
	assert_eq!(ground_truth.label("2"), None);
	assert!(!ground_truth.is_test("2"));
	// Labels outside the vocabulary are dropped but the vessel stays eligible.
	assert_eq!(ground_truth.label("3"), None);
	assert!(ground_truth.is_test("3"));
	assert_eq!(
		ground_truth.attribute("length"),
		maplit::btreemap! {
			"1".to_owned() => 30.5,
			"3".to_owned() => 12.0,
			"4".to_owned() => 45.0,
		}
	);
	assert_eq!(ground_truth.attribute("crew_size").len(), 1);
	assert!(ground_truth.attribute("tonnage").is_empty());
	assert_eq!(
		ground_truth.allow_list().into_iter().collect::<Vec<_>>(),
		vec!["1", "3", "4"]
	);
}

#[test]
fn test_non_positive_attribute() {
	let taxonomy = Taxonomy::builtin();
	let rows = vec![maplit::btreemap! {
		"mmsi".to_owned() => "9".to_owned(),
		"label".to_owned() => "tug".to_owned(),
		"length".to_owned() => "0".to_owned(),
		"split".to_owned() => "Test".to_owned(),
	}];
	let result = GroundTruth::from_rows(rows, &taxonomy, DEFAULT_TEST_SPLIT, DEFAULT_ATTRIBUTES);
	assert!(matches!(result, Err(Error::InvalidAttribute { .. })));
}

#[test]
fn test_binary_fishing_ranges() {
	let taxonomy = Taxonomy::builtin();
	let ground_truth =
		GroundTruth::from_csv(VESSELS_CSV.as_bytes(), &taxonomy, "Test", DEFAULT_ATTRIBUTES)
			.unwrap();
	let ranges = "\
mmsi,start_time,end_time,is_fishing
1,2015-01-01T00:00:00Z,2015-01-01T01:00:00Z,0.75
2,2015-01-01T00:00:00Z,2015-01-01T01:00:00Z,1
1,2015-01-01T02:00:00Z,2015-01-01T03:00:00Z,0.5
";
	let ranges = TrueFishingRanges::binary_from_csv(ranges.as_bytes(), &ground_truth).unwrap();
	assert_eq!(ranges.ranges_by_mmsi.len(), 1);
	let values: Vec<bool> = ranges.ranges_by_mmsi["1"]
		.iter()
		.map(|range| range.value)
		.collect();
	assert_eq!(values, vec![true, false]);
}

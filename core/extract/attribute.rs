use super::Extractor;
use crate::{
	record::InferenceRecord,
	taxonomy::UNKNOWN_LABEL,
	time::{DateRange, Timestamp},
};
use itertools::Itertools;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeRow {
	pub mmsi: String,
	pub start_time: Timestamp,
	pub inferred: f64,
	/// NaN when the vessel has no known value.
	pub true_value: f64,
	/// The vessel's true class, or `Unknown`.
	pub true_label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeResults {
	pub field: String,
	pub rows: Vec<AttributeRow>,
}

impl AttributeResults {
	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Rows with both an inferred and a true value, optionally restricted to `date_range`.
	pub fn known_rows(&self, date_range: Option<&DateRange>) -> Vec<&AttributeRow> {
		self.rows
			.iter()
			.filter(|row| !row.inferred.is_nan() && !row.true_value.is_nan())
			.filter(|row| date_range.map_or(true, |range| range.contains(&row.start_time)))
			.collect()
	}

	/// The distinct start dates of the rows, ascending.
	pub fn start_dates(&self) -> Vec<Timestamp> {
		self.rows
			.iter()
			.map(|row| row.start_time)
			.sorted()
			.dedup()
			.collect()
	}
}

/// Accumulates the scalar attribute stored under `field`.
pub struct AttributeExtractor<'a> {
	field: String,
	attribute_map: &'a BTreeMap<String, f64>,
	label_map: &'a BTreeMap<String, String>,
	rows: Vec<AttributeRow>,
}

impl<'a> AttributeExtractor<'a> {
	pub fn new(
		field: impl Into<String>,
		attribute_map: &'a BTreeMap<String, f64>,
		label_map: &'a BTreeMap<String, String>,
	) -> Self {
		Self {
			field: field.into(),
			attribute_map,
			label_map,
			rows: Vec::new(),
		}
	}

	pub fn finalize(self) -> AttributeResults {
		AttributeResults {
			field: self.field,
			rows: self.rows,
		}
	}
}

impl<'a> Extractor for AttributeExtractor<'a> {
	fn extract(&mut self, record: &InferenceRecord) {
		let inferred = match record.attributes.get(&self.field) {
			Some(inferred) => *inferred,
			None => return,
		};
		self.rows.push(AttributeRow {
			mmsi: record.mmsi.clone(),
			start_time: record.start_time,
			inferred,
			true_value: self
				.attribute_map
				.get(&record.mmsi)
				.copied()
				.unwrap_or(std::f64::NAN),
			true_label: self
				.label_map
				.get(&record.mmsi)
				.cloned()
				.unwrap_or_else(|| UNKNOWN_LABEL.to_owned()),
		});
	}
}

#[cfg(test)]
pub(crate) fn attribute_record(mmsi: &str, start_time: &str, field: &str, value: f64) -> InferenceRecord {
	InferenceRecord {
		mmsi: mmsi.to_owned(),
		start_time: crate::time::parse_timestamp(start_time).unwrap(),
		end_time: None,
		classifications: BTreeMap::new(),
		attributes: maplit::btreemap! { field.to_owned() => value },
		fishing: None,
	}
}

#[test]
fn test_attribute_extractor() {
	let lengths = maplit::btreemap! { "1".to_owned() => 30.0 };
	let labels = maplit::btreemap! { "1".to_owned() => "trawlers".to_owned() };
	let mut extractor = AttributeExtractor::new("length", &lengths, &labels);
	extractor.extract(&attribute_record("1", "2015-01-01T00:00:00", "length", 28.0));
	extractor.extract(&attribute_record("2", "2015-01-01T00:00:00", "length", 12.0));
	extractor.extract(&attribute_record("1", "2015-01-01T00:00:00", "tonnage", 500.0));
	let results = extractor.finalize();
	assert_eq!(results.rows.len(), 2);
	assert_eq!(results.rows[0].true_value, 30.0);
	assert_eq!(results.rows[0].true_label, "trawlers");
	assert!(results.rows[1].true_value.is_nan());
	assert_eq!(results.rows[1].true_label, UNKNOWN_LABEL);
	let known = results.known_rows(None);
	assert_eq!(known.len(), 1);
	assert_eq!(known[0].mmsi, "1");
}

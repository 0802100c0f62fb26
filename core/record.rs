/*!
Inference records: one observation of one vessel produced by the classifier. Each kind of payload a record may carry is modeled as its own optional block so extractors match on presence instead of probing raw field names.
*/

use crate::{
	error::{Error, Result},
	time::{parse_timestamp, Timestamp},
};
use std::collections::BTreeMap;

pub const FISHING_LOCALISATION_FIELD: &str = "fishing_localisation";

#[derive(Clone, Debug, PartialEq)]
pub struct InferenceRecord {
	pub mmsi: String,
	pub start_time: Timestamp,
	pub end_time: Option<Timestamp>,
	/// Classification blocks keyed by the field they were found under, such as `Multiclass`.
	pub classifications: BTreeMap<String, ClassificationBlock>,
	/// Scalar attribute predictions keyed by field, such as `length`.
	pub attributes: BTreeMap<String, f64>,
	pub fishing: Option<FishingBlock>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct ClassificationBlock {
	pub label_scores: BTreeMap<String, f64>,
	pub max_label: String,
}

/// An inclusive span of time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
	pub start: Timestamp,
	pub end: Timestamp,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FishingInterval {
	pub interval: Interval,
	pub is_fishing: bool,
}

/// Fishing localisation output of a record: the span the model looked at and the sub-intervals it labeled.
#[derive(Clone, Debug, PartialEq)]
pub struct FishingBlock {
	pub coverage: Interval,
	pub intervals: Vec<FishingInterval>,
}

#[derive(serde::Deserialize)]
struct RawRecord {
	mmsi: RawMmsi,
	start_time: String,
	#[serde(default)]
	end_time: Option<String>,
	#[serde(flatten)]
	fields: BTreeMap<String, serde_json::Value>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawMmsi {
	Text(String),
	Number(serde_json::Number),
}

#[derive(serde::Deserialize)]
struct RawFishingInterval {
	start_time: String,
	end_time: String,
	#[serde(default)]
	value: bool,
}

impl InferenceRecord {
	/// Decode one line of newline delimited json.
	pub fn from_json_str(line: &str) -> Result<InferenceRecord> {
		let value: serde_json::Value = serde_json::from_str(line)?;
		InferenceRecord::from_json(value)
	}

	/**
	Decode a record. Object fields with `label_scores` and `max_label` become classification blocks, object fields with a numeric `value` become attributes, and `fishing_localisation` becomes the fishing block. Other fields are ignored. Every timestamp must parse.
	*/
	pub fn from_json(value: serde_json::Value) -> Result<InferenceRecord> {
		let raw: RawRecord = serde_json::from_value(value)?;
		let mmsi = match raw.mmsi {
			RawMmsi::Text(mmsi) => mmsi.trim().to_owned(),
			RawMmsi::Number(mmsi) => mmsi.to_string(),
		};
		let start_time = parse_timestamp(&raw.start_time)?;
		let end_time = raw.end_time.as_deref().map(parse_timestamp).transpose()?;
		let mut classifications = BTreeMap::new();
		let mut attributes = BTreeMap::new();
		let mut fishing = None;
		for (field, value) in raw.fields.into_iter() {
			if field == FISHING_LOCALISATION_FIELD {
				let intervals: Vec<RawFishingInterval> = serde_json::from_value(value)?;
				let end_time =
					end_time.ok_or_else(|| Error::MissingField("end_time".to_owned()))?;
				let intervals = intervals
					.into_iter()
					.map(|interval| {
						Ok(FishingInterval {
							interval: Interval {
								start: parse_timestamp(&interval.start_time)?,
								end: parse_timestamp(&interval.end_time)?,
							},
							is_fishing: interval.value,
						})
					})
					.collect::<Result<Vec<_>>>()?;
				fishing = Some(FishingBlock {
					coverage: Interval {
						start: start_time,
						end: end_time,
					},
					intervals,
				});
				continue;
			}
			let object = match value.as_object() {
				Some(object) => object,
				None => continue,
			};
			if object.contains_key("label_scores") {
				let block: ClassificationBlock = serde_json::from_value(value)?;
				classifications.insert(field, block);
			} else if let Some(attribute) = object.get("value").and_then(|value| value.as_f64()) {
				attributes.insert(field, attribute);
			}
		}
		Ok(InferenceRecord {
			mmsi,
			start_time,
			end_time,
			classifications,
			attributes,
			fishing,
		})
	}
}

#[test]
fn test_from_json() {
	let record = InferenceRecord::from_json_str(
		r#"{
			"mmsi": " 123456789 ",
			"start_time": "2015-01-01T00:00:00Z",
			"end_time": "2015-07-01T00:00:00Z",
			"Multiclass": {"label_scores": {"trawlers": 0.75, "tug": 0.25}, "max_label": "trawlers"},
			"length": {"value": 31.5},
			"fishing_localisation": [
				{"start_time": "2015-01-02T00:00:00Z", "end_time": "2015-01-02T06:00:00Z", "value": true},
				{"start_time": "2015-01-03T00:00:00Z", "end_time": "2015-01-03T06:00:00Z", "value": false}
			],
			"comment": "ignored"
		}"#,
	)
	.unwrap();
	assert_eq!(record.mmsi, "123456789");
	assert_eq!(record.classifications["Multiclass"].max_label, "trawlers");
	assert_eq!(record.classifications["Multiclass"].label_scores["tug"], 0.25);
	assert_eq!(record.attributes["length"], 31.5);
	let fishing = record.fishing.unwrap();
	assert_eq!(fishing.coverage.start, record.start_time);
	assert_eq!(fishing.intervals.len(), 2);
	assert!(fishing.intervals[0].is_fishing);
	assert!(!fishing.intervals[1].is_fishing);
}

#[test]
fn test_numeric_mmsi_and_optional_blocks() {
	let record =
		InferenceRecord::from_json_str(r#"{"mmsi": 412000001, "start_time": "2016-03-01T12:00:00"}"#)
			.unwrap();
	assert_eq!(record.mmsi, "412000001");
	assert!(record.classifications.is_empty());
	assert!(record.attributes.is_empty());
	assert!(record.fishing.is_none());
}

#[test]
fn test_invalid_timestamp_is_fatal() {
	let result = InferenceRecord::from_json_str(r#"{"mmsi": "1", "start_time": "yesterday"}"#);
	assert!(matches!(result, Err(Error::InvalidTimestamp(_))));
}

#[test]
fn test_fishing_without_end_time() {
	let result = InferenceRecord::from_json_str(
		r#"{"mmsi": "1", "start_time": "2016-03-01T12:00:00", "fishing_localisation": []}"#,
	);
	assert!(matches!(result, Err(Error::MissingField(_))));
}

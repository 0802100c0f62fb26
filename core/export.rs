/*!
Flat csv exports of the per-vessel consolidated verdicts. Every dump holds one table covering all observations, named `ALL_YEARS`, plus one table per requested calendar year. Tables without vessels are skipped.
*/

use crate::{
	consolidate::{
		consolidate_across_dates, consolidate_attribute_across_dates, ConsolidatedResults,
	},
	error::Result,
	extract::{AttributeResults, InferenceResults},
	time::DateRange,
};
use std::{collections::BTreeMap, fs::File, io::Write, path::Path};
use tracing::{info, warn};

pub const ALL_YEARS: &str = "ALL_YEARS";

/// `ALL_YEARS` followed by one window per year, named by the year.
fn windows(years: &[i32]) -> Vec<(String, Option<DateRange>)> {
	let mut windows = vec![(ALL_YEARS.to_owned(), None)];
	for &year in years {
		match DateRange::year(year) {
			Some(range) => windows.push((year.to_string(), Some(range))),
			None => warn!("skipping out of range year {}", year),
		}
	}
	windows
}

/// Consolidate every observation of `results`, known or not, once per window.
pub fn label_tables(
	results: &InferenceResults,
	years: &[i32],
) -> Vec<(String, ConsolidatedResults)> {
	let all_results = results.all_results();
	windows(years)
		.into_iter()
		.filter_map(|(name, range)| {
			info!("processing label dump for {}", name);
			let consolidated = consolidate_across_dates(&all_results, range.as_ref());
			if consolidated.rows.is_empty() {
				None
			} else {
				Some((name, consolidated))
			}
		})
		.collect()
}

/// Write `mmsi,inferred,score,known` rows in lexical vessel order. The score is the largest mean score and `known` is empty for vessels without a label.
pub fn write_labels<W>(writer: W, consolidated: &ConsolidatedResults) -> Result<()>
where
	W: Write,
{
	let mut writer = csv::Writer::from_writer(writer);
	writer.write_record(&["mmsi", "inferred", "score", "known"])?;
	let mut rows: Vec<_> = consolidated.rows.iter().collect();
	rows.sort_by(|a, b| a.mmsi.cmp(&b.mmsi));
	for row in rows {
		let score = row.max_score().to_string();
		writer.write_record(&[
			row.mmsi.as_str(),
			row.inferred_label.as_str(),
			score.as_str(),
			row.true_label.as_deref().unwrap_or_default(),
		])?;
	}
	writer.flush()?;
	Ok(())
}

/// Write one `<name>.csv` per non-empty label table into `dir`.
pub fn dump_labels_to(dir: &Path, results: &InferenceResults, years: &[i32]) -> Result<()> {
	for (name, consolidated) in label_tables(results, years) {
		let path = dir.join(format!("{}.csv", name));
		info!("dumping labels to {}", path.display());
		write_labels(File::create(path)?, &consolidated)?;
	}
	Ok(())
}

/// Consolidated attributes of one window: vessel to field to `(inferred, known)`.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeTable {
	pub fields: Vec<String>,
	pub rows: BTreeMap<String, BTreeMap<String, (f64, f64)>>,
}

pub fn attribute_tables(
	results: &[AttributeResults],
	years: &[i32],
) -> Vec<(String, AttributeTable)> {
	windows(years)
		.into_iter()
		.filter_map(|(name, range)| {
			info!("processing attribute dump for {}", name);
			let mut rows: BTreeMap<String, BTreeMap<String, (f64, f64)>> = BTreeMap::new();
			for attribute in results.iter() {
				for row in consolidate_attribute_across_dates(attribute, range.as_ref()) {
					rows.entry(row.mmsi)
						.or_default()
						.insert(attribute.field.clone(), (row.inferred, row.true_value));
				}
			}
			if rows.is_empty() {
				return None;
			}
			let fields = results.iter().map(|attribute| attribute.field.clone()).collect();
			Some((name, AttributeTable { fields, rows }))
		})
		.collect()
}

/// Write `mmsi,inferred_<field>,known_<field>,…` rows in lexical vessel order. Missing and `NaN` values are written as empty cells.
pub fn write_attributes<W>(writer: W, table: &AttributeTable) -> Result<()>
where
	W: Write,
{
	let mut writer = csv::Writer::from_writer(writer);
	let mut header = vec!["mmsi".to_owned()];
	for field in table.fields.iter() {
		header.push(format!("inferred_{}", field));
		header.push(format!("known_{}", field));
	}
	writer.write_record(&header)?;
	let cell = |value: f64| {
		if value.is_nan() {
			String::new()
		} else {
			value.to_string()
		}
	};
	for (mmsi, values) in table.rows.iter() {
		let mut record = vec![mmsi.clone()];
		for field in table.fields.iter() {
			let (inferred, known) = values
				.get(field)
				.copied()
				.unwrap_or((std::f64::NAN, std::f64::NAN));
			record.push(cell(inferred));
			record.push(cell(known));
		}
		writer.write_record(&record)?;
	}
	writer.flush()?;
	Ok(())
}

/// Write one `<name>.csv` per non-empty attribute table into `dir`.
pub fn dump_attributes_to(dir: &Path, results: &[AttributeResults], years: &[i32]) -> Result<()> {
	for (name, table) in attribute_tables(results, years) {
		let path = dir.join(format!("{}.csv", name));
		info!("dumping attributes to {}", path.display());
		write_attributes(File::create(path)?, &table)?;
	}
	Ok(())
}

#[test]
fn test_write_labels() {
	use crate::{
		extract::{classified_record, ClassificationExtractor, Extractor},
		taxonomy::Taxonomy,
	};
	let taxonomy = Taxonomy::builtin();
	let label_map = maplit::btreemap! {
		"20".to_owned() => "trawlers".to_owned(),
	};
	let mut extractor = ClassificationExtractor::new("Multiclass", &label_map, &taxonomy);
	let records = vec![
		classified_record("20", "2015-01-01T00:00:00", &[("tug", 0.25), ("trawlers", 0.75)]),
		classified_record("100", "2016-01-01T00:00:00", &[("tug", 0.5), ("trawlers", 0.5)]),
	];
	for record in records.iter() {
		extractor.extract(record);
	}
	let tables = label_tables(&extractor.finalize(), &[2014, 2015, 2016]);
	let names: Vec<&str> = tables.iter().map(|(name, _)| name.as_str()).collect();
	assert_eq!(names, vec![ALL_YEARS, "2015", "2016"]);
	let mut output = Vec::new();
	write_labels(&mut output, &tables[0].1).unwrap();
	insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r###"
 mmsi,inferred,score,known
 100,tug,0.5,
 20,trawlers,0.75,trawlers
 "###);
}

#[test]
fn test_write_attributes() {
	use crate::extract::{attribute_record, AttributeExtractor, Extractor};
	let lengths = maplit::btreemap! { "1".to_owned() => 30.0 };
	let tonnages = BTreeMap::new();
	let labels = BTreeMap::new();
	let mut length = AttributeExtractor::new("length", &lengths, &labels);
	let mut tonnage = AttributeExtractor::new("tonnage", &tonnages, &labels);
	let records = vec![
		attribute_record("1", "2015-01-01T00:00:00", "length", 28.0),
		attribute_record("2", "2016-01-01T00:00:00", "tonnage", 120.5),
	];
	for record in records.iter() {
		length.extract(record);
		tonnage.extract(record);
	}
	let results = vec![length.finalize(), tonnage.finalize()];
	let tables = attribute_tables(&results, &[2016, 2017]);
	// Known values are not windowed, so every year with vessels gets a table.
	assert_eq!(tables.len(), 3);
	let mut output = Vec::new();
	write_attributes(&mut output, &tables[0].1).unwrap();
	insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r###"
 mmsi,inferred_length,known_length,inferred_tonnage,known_tonnage
 1,28,30,,
 2,,,120.5,
 "###);
	let mut output = Vec::new();
	write_attributes(&mut output, &tables[1].1).unwrap();
	insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r###"
 mmsi,inferred_length,known_length,inferred_tonnage,known_tonnage
 1,,30,,
 2,,,120.5,
 "###);
}

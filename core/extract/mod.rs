/*!
Extractors consume the inference stream one record at a time and accumulate what one kind of metric needs: classification scores, a scalar attribute, or fishing intervals. Each extractor is fed every record in arrival order and ignores records without its payload. When the stream ends, `finalize` turns it into an immutable result.
*/

use crate::{error::Result, record::InferenceRecord};
use std::collections::BTreeSet;
use tracing::{debug, info};

mod attribute;
mod classification;
mod fishing_range;

pub use self::attribute::{AttributeExtractor, AttributeResults, AttributeRow};
pub use self::classification::{ClassificationExtractor, ClassifiedRow, InferenceResults};
pub use self::fishing_range::{FishingRangeExtractor, FishingRangeResults};

#[cfg(test)]
pub(crate) use self::{attribute::attribute_record, classification::classified_record};

pub trait Extractor {
	/// Accumulate `record` if it carries this extractor's payload.
	fn extract(&mut self, record: &InferenceRecord);
}

/**
Feed every record of `records` to every extractor, in order. Records of vessels outside `allow_list` are skipped when an allow list is given. The first record that fails to decode aborts the pass.
*/
pub fn load_inferred<I>(
	records: I,
	extractors: &mut [&mut dyn Extractor],
	allow_list: Option<&BTreeSet<String>>,
) -> Result<u64>
where
	I: IntoIterator<Item = Result<InferenceRecord>>,
{
	let mut n_records = 0;
	let mut n_skipped = 0;
	for record in records {
		let record = record?;
		if let Some(allow_list) = allow_list {
			if !allow_list.contains(&record.mmsi) {
				n_skipped += 1;
				continue;
			}
		}
		for extractor in extractors.iter_mut() {
			extractor.extract(&record);
		}
		n_records += 1;
		if n_records % 100_000 == 0 {
			debug!("extracted {} records", n_records);
		}
	}
	info!(
		"extracted {} records, skipped {} outside the allow list",
		n_records, n_skipped
	);
	Ok(n_records)
}

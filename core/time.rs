use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub type Timestamp = DateTime<Utc>;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/**
Parse a UTC timestamp such as `2014-08-28T13:56:16`, optionally followed by fractional seconds and a `Z` or `+00:00` suffix. Offsets other than UTC are converted to UTC.
*/
pub fn parse_timestamp(value: &str) -> Result<Timestamp> {
	let value = value.trim();
	if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
		return Ok(timestamp.with_timezone(&Utc));
	}
	let naive = value.strip_suffix('Z').unwrap_or(value);
	let naive = naive.strip_suffix("+00:00").unwrap_or(naive);
	NAIVE_FORMATS
		.iter()
		.find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
		.map(|timestamp| Utc.from_utc_datetime(&timestamp))
		.ok_or_else(|| Error::InvalidTimestamp(value.to_owned()))
}

/// The number of whole minutes since the unix epoch, rounding toward negative infinity.
pub fn minute_of(timestamp: &Timestamp) -> i64 {
	timestamp.timestamp().div_euclid(60)
}

/// A half open range of timestamps, `[start, stop)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DateRange {
	pub start: Timestamp,
	pub stop: Timestamp,
}

impl DateRange {
	pub fn new(start: Timestamp, stop: Timestamp) -> Self {
		Self { start, stop }
	}

	/// January 1st of `year` up to January 1st of the next year.
	pub fn year(year: i32) -> Option<Self> {
		let start = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
		let stop = NaiveDate::from_ymd_opt(year + 1, 1, 1)?.and_hms_opt(0, 0, 0)?;
		Some(Self {
			start: Utc.from_utc_datetime(&start),
			stop: Utc.from_utc_datetime(&stop),
		})
	}

	pub fn contains(&self, timestamp: &Timestamp) -> bool {
		*timestamp >= self.start && *timestamp < self.stop
	}
}

#[test]
fn test_parse_timestamp() {
	let expected = Utc.from_utc_datetime(
		&NaiveDate::from_ymd_opt(2014, 8, 28)
			.unwrap()
			.and_hms_opt(13, 56, 16)
			.unwrap(),
	);
	for value in &[
		"2014-08-28T13:56:16",
		"2014-08-28T13:56:16Z",
		"2014-08-28T13:56:16+00:00",
		"2014-08-28 13:56:16",
		"2014-08-28T15:56:16+02:00",
	] {
		assert_eq!(parse_timestamp(value).unwrap(), expected, "{}", value);
	}
	let fractional = parse_timestamp("2014-08-28T13:56:16.999999").unwrap();
	assert_eq!(minute_of(&fractional), minute_of(&expected));
	assert!(matches!(
		parse_timestamp("28/08/2014"),
		Err(Error::InvalidTimestamp(_))
	));
}

#[test]
fn test_minute_of() {
	let timestamp = parse_timestamp("1970-01-01T00:01:59").unwrap();
	assert_eq!(minute_of(&timestamp), 1);
	let timestamp = parse_timestamp("1969-12-31T23:59:30").unwrap();
	assert_eq!(minute_of(&timestamp), -1);
}

#[test]
fn test_year_range() {
	let range = DateRange::year(2015).unwrap();
	assert!(range.contains(&parse_timestamp("2015-01-01T00:00:00").unwrap()));
	assert!(range.contains(&parse_timestamp("2015-12-31T23:59:59").unwrap()));
	assert!(!range.contains(&parse_timestamp("2016-01-01T00:00:00").unwrap()));
}

use chrono::{DateTime, Utc};

use crate::archive::{ArchiveError, Result};

/// Seconds from the Unix epoch to 2001-01-01T00:00:00Z, the archive reference epoch.
pub const REFERENCE_EPOCH_UNIX: i64 = (31 * 365 + 31 / 4 + 1) * 24 * 60 * 60;

const MICROS_PER_SECOND: u32 = 1_000_000;

/// Signed seconds between the reference epoch and `instant`, keeping sub-second precision.
pub fn to_reference_offset(instant: &DateTime<Utc>) -> f64 {
	let whole = instant.timestamp() - REFERENCE_EPOCH_UNIX;
	whole as f64 + f64::from(instant.timestamp_subsec_nanos()) / 1e9
}

/// Instant `offset` seconds after the reference epoch.
///
/// The fraction is snapped to whole microseconds: an `f64` offset in the range of real dates
/// cannot carry finer detail, so sub-microsecond digits are encoding noise. Instants with
/// nanosecond detail therefore come back truncated to the nearest microsecond.
pub fn from_reference_offset(offset: f64) -> Result<DateTime<Utc>> {
	if !offset.is_finite() {
		return Err(ArchiveError::TimestampOutOfRange { offset });
	}

	let whole = offset.floor();
	let mut secs = whole as i64;
	let mut micros = ((offset - whole) * 1e6).round() as u32;
	if micros >= MICROS_PER_SECOND {
		secs += 1;
		micros -= MICROS_PER_SECOND;
	}

	secs.checked_add(REFERENCE_EPOCH_UNIX)
		.and_then(|unix| DateTime::from_timestamp(unix, micros * 1_000))
		.ok_or(ArchiveError::TimestampOutOfRange { offset })
}

#[cfg(test)]
mod tests {
	use chrono::{TimeZone, Utc};

	use super::{REFERENCE_EPOCH_UNIX, from_reference_offset, to_reference_offset};

	#[test]
	fn reference_epoch_constant_matches_calendar() {
		let epoch = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).single().expect("valid date");
		assert_eq!(epoch.timestamp(), REFERENCE_EPOCH_UNIX);
		assert_eq!(to_reference_offset(&epoch), 0.0);
	}

	#[test]
	fn negative_offsets_precede_the_epoch() {
		let instant = from_reference_offset(-1.5).expect("offset converts");
		assert_eq!(instant.timestamp(), REFERENCE_EPOCH_UNIX - 2);
		assert_eq!(instant.timestamp_subsec_millis(), 500);
	}

	#[test]
	fn millisecond_instants_survive_the_float_offset() {
		for millis in [1, 7, 123, 333, 999] {
			let instant = Utc.timestamp_millis_opt(1_700_000_000_000 + millis).single().expect("valid instant");
			let restored = from_reference_offset(to_reference_offset(&instant)).expect("offset converts");
			assert_eq!(restored, instant, "millis {millis}");
		}
	}

	#[test]
	fn microsecond_instants_survive_far_from_the_epoch() {
		let instant = Utc.timestamp_opt(4_102_444_800, 999_999_000).single().expect("valid instant");
		let restored = from_reference_offset(to_reference_offset(&instant)).expect("offset converts");
		assert_eq!(restored, instant);
	}

	#[test]
	fn non_finite_offsets_are_rejected() {
		assert!(from_reference_offset(f64::NAN).is_err());
		assert!(from_reference_offset(f64::INFINITY).is_err());
	}
}

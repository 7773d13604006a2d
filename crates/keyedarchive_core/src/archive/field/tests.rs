use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::archive::{ArchiveError, Archiver, ClassDescriptor, ClassKind, Dictionary, Field, Format, ObjectGraph, Shape, Uid, Value};

fn restore<T: Field + Default>(value: Value) -> crate::archive::Result<T> {
	Archiver::new().reconstruct::<T>(&ObjectGraph::single(value))
}

#[test]
fn integers_convert_within_range() {
	assert_eq!(restore::<u8>(Value::I64(200)).expect("fits u8"), 200);
	assert_eq!(restore::<i16>(Value::U64(300)).expect("fits i16"), 300);
	assert_eq!(restore::<u64>(Value::U64(u64::MAX)).expect("fits u64"), u64::MAX);

	let err = restore::<u8>(Value::I64(-1)).expect_err("negative into u8");
	assert!(matches!(err, ArchiveError::IntegerOutOfRange { value: -1, target: Shape::Integer("u8") }));
	let err = restore::<i64>(Value::U64(u64::MAX)).expect_err("too large for i64");
	assert!(matches!(err, ArchiveError::IntegerOutOfRange { .. }));
}

#[test]
fn primitive_kinds_must_match() {
	let err = restore::<bool>(Value::I64(1)).expect_err("int into bool");
	assert!(matches!(err, ArchiveError::TypeMismatch { expected: Shape::Bool, got: "signed integer" }));

	let err = restore::<String>(Value::F64(1.5)).expect_err("float into string");
	assert!(matches!(err, ArchiveError::TypeMismatch { expected: Shape::String, .. }));

	let err = restore::<f64>(Value::from("1.5")).expect_err("string into float");
	assert!(matches!(err, ArchiveError::TypeMismatch { expected: Shape::Float, .. }));
}

#[test]
fn floats_narrow_to_f32() {
	assert_eq!(restore::<f32>(Value::F64(0.5)).expect("float"), 0.5_f32);
}

#[test]
fn null_marker_restores_as_marker_text_or_none() {
	let graph = ObjectGraph::new(vec![Value::from("$null")], Uid(0)).expect("graph");
	let archiver = Archiver::new();
	assert_eq!(archiver.reconstruct::<String>(&graph).expect("string"), "$null");
	assert_eq!(archiver.reconstruct::<Option<i64>>(&graph).expect("option"), None);
}

#[test]
fn byte_vectors_accept_raw_data_and_blobs() {
	assert_eq!(restore::<Vec<u8>>(Value::Bytes(vec![1, 2, 3])).expect("raw bytes"), [1, 2, 3]);

	let archiver = Archiver::new();
	let graph = archiver.flatten(&vec![9_u8, 8, 7]).expect("flatten bytes");
	assert_eq!(archiver.reconstruct::<Vec<u8>>(&graph).expect("blob"), [9, 8, 7]);

	let err = restore::<Vec<String>>(Value::Bytes(vec![1])).expect_err("bytes into string list");
	assert!(matches!(err, ArchiveError::TypeMismatch { expected: Shape::Sequence, .. }));
}

#[test]
fn inline_arrays_restore_element_wise() {
	let items = Value::Array(vec![Value::I64(1), Value::I64(2)]);
	assert_eq!(restore::<Vec<i32>>(items).expect("inline array"), [1, 2]);
}

#[test]
fn maps_restore_from_plain_and_wrapped_dictionaries() {
	let plain: Dictionary = [("a", Value::I64(1)), ("b", Value::I64(2))].into_iter().collect();
	let restored = restore::<BTreeMap<String, i64>>(Value::Dict(plain)).expect("plain dictionary");
	assert_eq!(restored, BTreeMap::from([("a".to_owned(), 1), ("b".to_owned(), 2)]));

	let archiver = Archiver::new();
	let source = HashMap::from([("x".to_owned(), "one".to_owned()), ("y".to_owned(), "two".to_owned())]);
	let graph = archiver.flatten(&source).expect("flatten map");
	assert_eq!(archiver.reconstruct::<HashMap<String, String>>(&graph).expect("wrapped dictionary"), source);
}

#[test]
fn timestamps_keep_subsecond_precision() {
	let archiver = Archiver::new();
	let instant = Utc.timestamp_opt(1_700_000_000, 250_000_000).single().expect("valid instant");
	let graph = archiver.flatten(&instant).expect("flatten timestamp");
	assert_eq!(archiver.reconstruct::<DateTime<Utc>>(&graph).expect("timestamp"), instant);
}

#[test]
fn millisecond_timestamps_round_trip_through_both_formats() {
	let archiver = Archiver::new();
	for millis in [1, 7, 123, 333, 999] {
		let instant = Utc.timestamp_millis_opt(1_700_000_000_000 + millis).single().expect("valid instant");
		for format in [Format::Binary, Format::Xml] {
			let bytes = archiver.marshal(&instant, format).expect("marshal timestamp");
			let mut restored = DateTime::<Utc>::default();
			archiver.unmarshal_bytes(&bytes, &mut restored).expect("unmarshal timestamp");
			assert_eq!(restored, instant, "millis {millis} via {}", format.as_str());
		}
	}
}

#[test]
fn bare_offsets_restore_as_timestamps() {
	let restored = restore::<DateTime<Utc>>(Value::F64(86_400.0)).expect("plain plist date");
	assert_eq!(restored, Utc.with_ymd_and_hms(2001, 1, 2, 0, 0, 0).single().expect("valid date"));
}

#[test]
fn identifiers_require_sixteen_bytes() {
	let archiver = Archiver::new();
	let id = Uuid::from_bytes([0x42; 16]);
	let graph = archiver.flatten(&id).expect("flatten uuid");
	assert_eq!(archiver.reconstruct::<Uuid>(&graph).expect("uuid"), id);

	let class = ClassDescriptor::builtin(ClassKind::UniqueIdentifier).expect("builtin").to_value();
	let wrapper: Dictionary = [("NS.uuidbytes", Value::Bytes(vec![1, 2, 3, 4])), ("$class", Value::Ref(Uid(1)))].into_iter().collect();
	let short = ObjectGraph::new(vec![Value::from("$null"), class, Value::Dict(wrapper)], Uid(2)).expect("graph");
	let err = archiver.reconstruct::<Uuid>(&short).expect_err("short payload");
	assert!(matches!(err, ArchiveError::InvalidIdentifier { len: 4 }));
}

#[test]
fn opaque_values_cannot_hold_nulls_or_references() {
	let archiver = Archiver::new();
	let err = archiver.flatten(&Value::Array(vec![Value::Null])).expect_err("null element");
	assert!(matches!(err, ArchiveError::UnsupportedKind { kind: "null" }));
	let err = archiver.flatten(&Value::Ref(Uid(1))).expect_err("raw reference");
	assert!(matches!(err, ArchiveError::UnsupportedKind { kind: "reference" }));
}

#[test]
fn boxed_values_delegate() {
	let archiver = Archiver::new();
	let graph = archiver.flatten(&Box::new(7_i32)).expect("flatten box");
	assert_eq!(*archiver.reconstruct::<Box<i32>>(&graph).expect("box"), 7);
}

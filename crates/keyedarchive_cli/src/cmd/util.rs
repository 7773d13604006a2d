use std::path::Path;

use keyedarchive::archive::class::{CLASS_KEY, CLASS_NAME_KEY};
use keyedarchive::archive::{ClassDescriptor, Document, ObjectGraph, Result, Value, codec, from_reference_offset};

/// Read and decode a plist file, keeping the container and format it came in.
pub(crate) fn load(path: &Path) -> Result<Document> {
	let bytes = std::fs::read(path)?;
	let document = codec::decode_document(&bytes)?;
	tracing::debug!(
		path = %path.display(),
		objects = document.graph.len(),
		container = document.container.as_str(),
		"loaded plist"
	);
	Ok(document)
}

/// Class name of an object that carries a `$class` reference.
pub(crate) fn class_of<'g>(graph: &'g ObjectGraph, object: &'g Value) -> Option<&'g str> {
	let uid = object.as_dict()?.get(CLASS_KEY)?.as_ref_uid()?;
	graph.get(uid).ok()?.as_dict()?.get(CLASS_NAME_KEY)?.as_str()
}

/// Short one-line description of an object table entry.
pub(crate) fn summarize(graph: &ObjectGraph, object: &Value, max_len: usize) -> String {
	match object {
		Value::Null => "null".to_owned(),
		Value::Bool(flag) => flag.to_string(),
		Value::I64(number) => number.to_string(),
		Value::U64(number) => number.to_string(),
		Value::F64(number) => number.to_string(),
		Value::Date(offset) => match from_reference_offset(*offset) {
			Ok(instant) => instant.to_rfc3339(),
			Err(_) => format!("date {offset}"),
		},
		Value::String(text) => truncate(text, max_len),
		Value::Bytes(bytes) => format!("{} bytes", bytes.len()),
		Value::Ref(uid) => uid.to_string(),
		Value::Array(items) => format!("{} items", items.len()),
		Value::Dict(dict) => {
			if let Some(descriptor) = ClassDescriptor::from_dict(dict) {
				return format!("class {}", descriptor.name);
			}
			match class_of(graph, object) {
				Some(class) => format!("{class} object"),
				None => format!("{} entries", dict.len()),
			}
		}
	}
}

fn truncate(text: &str, max_len: usize) -> String {
	match text.char_indices().nth(max_len) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.to_owned(),
	}
}

/// Print a serializable payload as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) {
	match serde_json::to_string_pretty(payload) {
		Ok(text) => println!("{text}"),
		Err(err) => eprintln!("error: json encode failed: {err}"),
	}
}

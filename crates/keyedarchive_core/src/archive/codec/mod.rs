use std::io::Cursor;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::archive::epoch::REFERENCE_EPOCH_UNIX;
use crate::archive::{ArchiveError, Dictionary, ObjectGraph, Result, Uid, Value};

/// Archiver name written into produced containers.
pub const ARCHIVER_NAME: &str = "NSKeyedArchiver";
/// Container format version written into produced containers.
pub const ARCHIVE_VERSION: u64 = 100_000;

const OBJECTS_ENTRY: &str = "$objects";
const TOP_ENTRY: &str = "$top";
const ROOT_ENTRY: &str = "root";
const ARCHIVER_ENTRY: &str = "$archiver";
const VERSION_ENTRY: &str = "$version";
const BINARY_MAGIC: &[u8] = b"bplist";
/// XML plists have no UID type; references are written as single-entry dictionaries.
const XML_UID_KEY: &str = "CF$UID";

/// Serialized plist flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
	/// `bplist00` binary form.
	#[default]
	Binary,
	/// XML form.
	Xml,
}

impl Format {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Binary => "binary",
			Self::Xml => "xml",
		}
	}
}

/// Outer shape of a decoded plist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
	/// `$archiver` / `$objects` / `$top` keyed-archive container.
	KeyedArchive,
	/// Any other plist, held as a one-object graph.
	Plain,
}

impl Container {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::KeyedArchive => "keyed_archive",
			Self::Plain => "plain",
		}
	}
}

/// Decoded plist together with the container and flavour it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
	/// Object table and root.
	pub graph: ObjectGraph,
	/// Container detected while parsing.
	pub container: Container,
	/// Serialized flavour of the input bytes.
	pub format: Format,
}

impl Document {
	/// Serialize the graph again inside the container it came from.
	pub fn encode(&self, format: Format) -> Result<Vec<u8>> {
		match self.container {
			Container::KeyedArchive => encode(&self.graph, format),
			Container::Plain => encode_plain(self.graph.root_object()?, format),
		}
	}
}

/// Parse plist bytes (binary or XML) into an object graph.
///
/// Keyed-archive containers yield their object table and `$top.root`; any other plist is
/// wrapped as a one-object graph.
pub fn decode(bytes: &[u8]) -> Result<ObjectGraph> {
	decode_document(bytes).map(|document| document.graph)
}

/// Parse plist bytes, reporting which container and flavour they held.
pub fn decode_document(bytes: &[u8]) -> Result<Document> {
	let format = if bytes.starts_with(BINARY_MAGIC) { Format::Binary } else { Format::Xml };
	let parsed = plist::Value::from_reader(Cursor::new(bytes))?;

	let container = match parsed {
		plist::Value::Dictionary(container) if is_keyed_archive(&container) => container,
		other => {
			tracing::debug!(format = format.as_str(), "plist is not a keyed archive, wrapping as single value");
			return Ok(Document {
				graph: ObjectGraph::single(from_plist(other)),
				container: Container::Plain,
				format,
			});
		}
	};

	let objects = match container.get(OBJECTS_ENTRY) {
		Some(plist::Value::Array(items)) => items.iter().cloned().map(from_plist).collect(),
		_ => return Err(ArchiveError::NotKeyedArchive { reason: "$objects is not an array" }),
	};
	let root = match container.get(TOP_ENTRY).cloned().map(from_plist) {
		Some(Value::Dict(top)) => match top.get(ROOT_ENTRY) {
			Some(Value::Ref(uid)) => *uid,
			_ => return Err(ArchiveError::NotKeyedArchive { reason: "$top.root is not a reference" }),
		},
		_ => return Err(ArchiveError::NotKeyedArchive { reason: "$top is not a dictionary" }),
	};

	let graph = ObjectGraph::new(objects, root)?;
	tracing::debug!(objects = graph.len(), root = root.get(), format = format.as_str(), "decoded keyed archive");
	Ok(Document {
		graph,
		container: Container::KeyedArchive,
		format,
	})
}

/// Serialize an object graph as a keyed-archive container.
pub fn encode(graph: &ObjectGraph, format: Format) -> Result<Vec<u8>> {
	let mut top = plist::Dictionary::new();
	top.insert(ROOT_ENTRY.to_owned(), to_plist(&Value::Ref(graph.root), format)?);

	let mut container = plist::Dictionary::new();
	container.insert(VERSION_ENTRY.to_owned(), plist::Value::Integer(ARCHIVE_VERSION.into()));
	container.insert(
		OBJECTS_ENTRY.to_owned(),
		plist::Value::Array(graph.objects.iter().map(|object| to_plist(object, format)).collect::<Result<_>>()?),
	);
	container.insert(ARCHIVER_ENTRY.to_owned(), plist::Value::String(ARCHIVER_NAME.to_owned()));
	container.insert(TOP_ENTRY.to_owned(), plist::Value::Dictionary(top));

	write(plist::Value::Dictionary(container), format)
}

/// Serialize a single value as a plain plist.
pub fn encode_plain(value: &Value, format: Format) -> Result<Vec<u8>> {
	write(to_plist(value, format)?, format)
}

fn write(value: plist::Value, format: Format) -> Result<Vec<u8>> {
	let mut out = Vec::new();
	match format {
		Format::Binary => value.to_writer_binary(&mut out)?,
		Format::Xml => value.to_writer_xml(&mut out)?,
	}
	tracing::trace!(format = format.as_str(), bytes = out.len(), "serialized plist");
	Ok(out)
}

fn is_keyed_archive(container: &plist::Dictionary) -> bool {
	container.contains_key(OBJECTS_ENTRY) && container.contains_key(TOP_ENTRY) && container.contains_key(ARCHIVER_ENTRY)
}

fn from_plist(value: plist::Value) -> Value {
	match value {
		plist::Value::Boolean(flag) => Value::Bool(flag),
		plist::Value::Integer(number) => match number.as_signed() {
			Some(signed) => Value::I64(signed),
			None => number.as_unsigned().map_or(Value::Null, Value::U64),
		},
		plist::Value::Real(real) => Value::F64(real),
		plist::Value::String(text) => Value::String(text.into()),
		plist::Value::Data(bytes) => Value::Bytes(bytes),
		plist::Value::Date(date) => Value::Date(date_offset(SystemTime::from(date))),
		plist::Value::Uid(uid) => Value::Ref(Uid(uid.get())),
		plist::Value::Array(items) => Value::Array(items.into_iter().map(from_plist).collect()),
		plist::Value::Dictionary(dict) => match xml_uid(&dict) {
			Some(uid) => Value::Ref(uid),
			None => Value::Dict(dict.into_iter().map(|(key, item)| (key, from_plist(item))).collect::<Dictionary>()),
		},
		_ => Value::Null,
	}
}

fn xml_uid(dict: &plist::Dictionary) -> Option<Uid> {
	if dict.len() != 1 {
		return None;
	}
	dict.get(XML_UID_KEY)?.as_unsigned_integer().map(Uid)
}

fn to_plist(value: &Value, format: Format) -> Result<plist::Value> {
	Ok(match value {
		Value::Null => return Err(ArchiveError::UnsupportedKind { kind: "null" }),
		Value::Bool(flag) => plist::Value::Boolean(*flag),
		Value::I64(number) => plist::Value::Integer((*number).into()),
		Value::U64(number) => plist::Value::Integer((*number).into()),
		Value::F64(real) => plist::Value::Real(*real),
		Value::Date(offset) => plist::Value::Date(date_at(*offset)?.into()),
		Value::String(text) => plist::Value::String(text.to_string()),
		Value::Bytes(bytes) => plist::Value::Data(bytes.clone()),
		Value::Ref(uid) => match format {
			Format::Binary => plist::Value::Uid(plist::Uid::new(uid.get())),
			Format::Xml => {
				let mut reference = plist::Dictionary::new();
				reference.insert(XML_UID_KEY.to_owned(), plist::Value::Integer(uid.get().into()));
				plist::Value::Dictionary(reference)
			}
		},
		Value::Array(items) => plist::Value::Array(items.iter().map(|item| to_plist(item, format)).collect::<Result<_>>()?),
		Value::Dict(dict) => {
			let mut out = plist::Dictionary::new();
			for (key, item) in dict.iter() {
				out.insert(key.to_owned(), to_plist(item, format)?);
			}
			plist::Value::Dictionary(out)
		}
	})
}

/// Plist date `offset` seconds after the reference epoch.
fn date_at(offset: f64) -> Result<SystemTime> {
	let unix = offset + REFERENCE_EPOCH_UNIX as f64;
	let span = Duration::try_from_secs_f64(unix.abs()).ok();
	let instant = span.and_then(|span| if unix >= 0.0 { UNIX_EPOCH.checked_add(span) } else { UNIX_EPOCH.checked_sub(span) });
	instant.ok_or(ArchiveError::TimestampOutOfRange { offset })
}

/// Seconds between the reference epoch and a plist date.
fn date_offset(instant: SystemTime) -> f64 {
	let unix = match instant.duration_since(UNIX_EPOCH) {
		Ok(after) => after.as_secs_f64(),
		Err(before) => -before.duration().as_secs_f64(),
	};
	unix - REFERENCE_EPOCH_UNIX as f64
}

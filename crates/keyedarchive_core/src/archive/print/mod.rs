use std::collections::HashSet;
use std::fmt::Write as _;

use uuid::Uuid;

use crate::archive::class::{CLASS_KEY, CLASS_NAME_KEY, DATA_KEY, KEYS_KEY, OBJECTS_KEY, TIME_KEY, UUID_BYTES_KEY};
use crate::archive::epoch::from_reference_offset;
use crate::archive::{ClassKind, Dictionary, ObjectGraph, Uid, Value};

/// Output truncation limits for [`render_with`].
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
	/// Maximum nesting depth before containers collapse to `{...}`.
	pub max_depth: u32,
	/// Maximum number of characters printed for strings and hex payloads.
	pub max_string_len: usize,
	/// Maximum number of entries printed per container.
	pub max_items: usize,
	/// Maximum number of values rendered in total; later values print as `...`.
	pub max_nodes: usize,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self {
			max_depth: 32,
			max_string_len: 200,
			max_items: 64,
			max_nodes: 100_000,
		}
	}
}

impl PrintOptions {
	/// Preset for quick terminal inspection.
	pub fn compact() -> Self {
		Self {
			max_depth: 4,
			max_string_len: 60,
			max_items: 8,
			max_nodes: 512,
		}
	}
}

/// Render the graph from its root with default limits.
pub fn render(graph: &ObjectGraph) -> String {
	render_with(graph, &PrintOptions::default())
}

/// Render the graph from its root.
///
/// Malformed input never panics: bad references print as `<invalid #n>`, references back into the
/// current path as `<cycle #n>`, and unreadable wrappers as `unknown(...)`. A container reached
/// through a second reference prints as `<shared #n>` after its first full rendering, so output
/// stays linear in the size of the table.
pub fn render_with(graph: &ObjectGraph, options: &PrintOptions) -> String {
	let mut printer = Printer {
		graph,
		options,
		active: Vec::new(),
		expanded: HashSet::new(),
		nodes: 0,
	};
	printer.reference(graph.root, 0)
}

struct Printer<'g> {
	graph: &'g ObjectGraph,
	options: &'g PrintOptions,
	active: Vec<Uid>,
	expanded: HashSet<Uid>,
	nodes: usize,
}

impl<'g> Printer<'g> {
	fn reference(&mut self, uid: Uid, depth: u32) -> String {
		let graph = self.graph;
		let Ok(value) = graph.get(uid) else {
			return format!("<invalid {uid}>");
		};
		if self.active.contains(&uid) {
			return format!("<cycle {uid}>");
		}
		if self.is_container(value) && !self.expanded.insert(uid) {
			return format!("<shared {uid}>");
		}

		self.active.push(uid);
		let text = self.value(value, depth);
		self.active.pop();
		text
	}

	fn value(&mut self, value: &'g Value, depth: u32) -> String {
		self.nodes += 1;
		if self.nodes > self.options.max_nodes {
			return "...".to_owned();
		}

		match value {
			Value::Null => "null".to_owned(),
			Value::Bool(flag) => format!("bool({flag})"),
			Value::I64(number) => format!("int64({number})"),
			Value::U64(number) => format!("uint64({number})"),
			Value::F64(real) => format!("float64({real})"),
			Value::Date(offset) => self.timestamp(*offset, "date"),
			Value::String(text) => format!("string({})", self.truncate(text)),
			Value::Bytes(bytes) => format!("[]byte({})", self.hex(bytes)),
			Value::Ref(uid) => self.reference(*uid, depth),
			Value::Array(items) => {
				let entries = items.iter().enumerate().map(|(index, item)| (index.to_string(), item)).collect();
				self.block("[]interface", entries, depth)
			}
			Value::Dict(dict) => self.mapping(dict, depth),
		}
	}

	fn mapping(&mut self, dict: &'g Dictionary, depth: u32) -> String {
		let Some(class_ref) = dict.get(CLASS_KEY) else {
			let entries = dict.iter().map(|(key, item)| (key.to_owned(), item)).collect();
			return self.block("dict", entries, depth);
		};
		let Some(class) = self.class_name(class_ref) else {
			return format!("unknown(class {})", class_ref.as_ref_uid().map_or_else(|| class_ref.kind().to_owned(), |uid| uid.to_string()));
		};

		match ClassKind::of_name(class) {
			ClassKind::Timestamp => match self.payload(dict, TIME_KEY) {
				Some(Value::F64(offset)) => self.timestamp(*offset, class),
				Some(Value::I64(offset)) => self.timestamp(*offset as f64, class),
				_ => format!("unknown({class})"),
			},
			ClassKind::ByteBlob => match self.payload(dict, DATA_KEY) {
				Some(Value::Bytes(bytes)) => format!("[]byte({})", self.hex(bytes)),
				_ => format!("unknown({class})"),
			},
			ClassKind::UniqueIdentifier => match self.payload(dict, UUID_BYTES_KEY).and_then(|value| match value {
				Value::Bytes(bytes) => Uuid::from_slice(bytes).ok(),
				_ => None,
			}) {
				Some(id) => format!("UUID({id})"),
				None => format!("unknown({class})"),
			},
			ClassKind::OrderedCollection => match self.payload(dict, OBJECTS_KEY) {
				Some(Value::Array(items)) => {
					let entries = items.iter().enumerate().map(|(index, item)| (index.to_string(), item)).collect();
					self.block("[]array", entries, depth)
				}
				_ => format!("unknown({class})"),
			},
			ClassKind::KeyValueCollection => match (self.payload(dict, KEYS_KEY), self.payload(dict, OBJECTS_KEY)) {
				(Some(Value::Array(keys)), Some(Value::Array(values))) if keys.len() == values.len() => {
					let entries = keys
						.iter()
						.zip(values)
						.map(|(key, item)| {
							let label = match self.resolve(key) {
								Some(Value::String(text)) => text.to_string(),
								_ => "?".to_owned(),
							};
							(label, item)
						})
						.collect();
					self.block("struct", entries, depth)
				}
				_ => format!("unknown({class})"),
			},
			ClassKind::Custom | ClassKind::Unknown => {
				let entries = dict.iter().filter(|(key, _)| *key != CLASS_KEY).map(|(key, item)| (key.to_owned(), item)).collect();
				self.block(class, entries, depth)
			}
		}
	}

	fn block(&mut self, head: &str, entries: Vec<(String, &'g Value)>, depth: u32) -> String {
		if depth >= self.options.max_depth {
			return format!("{head}{{...}}");
		}

		let pad = "\t".repeat(depth as usize + 1);
		let mut out = format!("{head}{{\n");
		let total = entries.len();
		for (label, item) in entries.into_iter().take(self.options.max_items) {
			let rendered = self.value(item, depth + 1);
			let _ = writeln!(out, "{pad}[{label}]: {rendered}");
		}
		if total > self.options.max_items {
			let _ = writeln!(out, "{pad}... {} more", total - self.options.max_items);
		}
		out.push_str(&"\t".repeat(depth as usize));
		out.push('}');
		out
	}

	/// Values that print as a block; leaf wrappers and scalars repeat in full.
	fn is_container(&self, value: &'g Value) -> bool {
		match value {
			Value::Array(_) => true,
			Value::Dict(dict) => match dict.get(CLASS_KEY).and_then(|class_ref| self.class_name(class_ref)) {
				Some(class) => !matches!(
					ClassKind::of_name(class),
					ClassKind::Timestamp | ClassKind::ByteBlob | ClassKind::UniqueIdentifier
				),
				None => true,
			},
			_ => false,
		}
	}

	fn timestamp(&self, offset: f64, class: &str) -> String {
		match from_reference_offset(offset) {
			Ok(instant) => format!("time({instant})"),
			Err(_) => format!("unknown({class} {offset})"),
		}
	}

	fn class_name(&self, class_ref: &'g Value) -> Option<&'g str> {
		if !matches!(class_ref, Value::Ref(_)) {
			return None;
		}
		self.resolve(class_ref)?.as_dict()?.get(CLASS_NAME_KEY)?.as_str()
	}

	fn payload(&self, dict: &'g Dictionary, key: &str) -> Option<&'g Value> {
		self.resolve(dict.get(key)?)
	}

	fn resolve(&self, mut value: &'g Value) -> Option<&'g Value> {
		let graph = self.graph;
		for _ in 0..=graph.len() {
			let Value::Ref(uid) = value else {
				return Some(value);
			};
			value = graph.get(*uid).ok()?;
		}
		None
	}

	fn truncate(&self, text: &str) -> String {
		let max = self.options.max_string_len;
		if text.chars().count() <= max {
			return text.to_owned();
		}
		let mut out: String = text.chars().take(max).collect();
		out.push_str("...");
		out
	}

	fn hex(&self, bytes: &[u8]) -> String {
		let mut out = String::with_capacity(bytes.len() * 2);
		for byte in bytes {
			let _ = write!(out, "{byte:02x}");
		}
		self.truncate(&out)
	}
}

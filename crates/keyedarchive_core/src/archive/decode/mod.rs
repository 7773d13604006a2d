use std::collections::{HashMap, HashSet};

use crate::archive::class::{CLASS_KEY, CLASS_NAME_KEY, DATA_KEY, KEYS_KEY, OBJECTS_KEY, TIME_KEY, UUID_BYTES_KEY};
use crate::archive::{
	ArchiveError, ClassKind, ClassTable, Dictionary, Field, ObjectGraph, Record, Result, Shape, TypeRegistry, Uid, Value, field_by_path_mut,
};

/// Decoder limits and strictness.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
	/// Maximum nesting depth of decoded values.
	pub max_depth: u32,
	/// Fail when a non-omittable record field has no archived entry.
	pub strict_fields: bool,
	/// Maximum number of values restored per decode; shared references count once per use.
	pub max_values: usize,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			max_depth: 512,
			strict_fields: false,
			max_values: 1_000_000,
		}
	}
}

impl DecodeOptions {
	/// Defaults with missing-field checks enabled.
	pub fn strict() -> Self {
		Self {
			strict_fields: true,
			..Self::default()
		}
	}
}

/// Archived object carrying a resolved class.
#[derive(Debug, Clone, Copy)]
pub struct Object<'g> {
	/// Class name read from the descriptor.
	pub class: &'g str,
	/// Classification of `class`.
	pub kind: ClassKind,
	/// Object body, including the `$class` entry.
	pub dict: &'g Dictionary,
}

/// One resolved object-table value, as handed to [`Field::restore`].
#[derive(Debug, Clone, Copy)]
pub enum Node<'g> {
	/// `$null` sentinel or explicit null.
	Null,
	/// Boolean scalar.
	Bool(bool),
	/// Signed integer scalar.
	Int(i64),
	/// Unsigned integer scalar.
	UInt(u64),
	/// Floating point scalar.
	Float(f64),
	/// Plain plist date, as seconds from the reference epoch.
	Date(f64),
	/// String scalar.
	String(&'g str),
	/// Raw byte payload.
	Bytes(&'g [u8]),
	/// Inline array without a class.
	Array(&'g [Value]),
	/// Mapping without a `$class` entry.
	Dict(&'g Dictionary),
	/// Mapping with a resolved class.
	Object(Object<'g>),
}

impl Node<'_> {
	/// Stable label for the node kind.
	pub fn kind(&self) -> &'static str {
		match self {
			Node::Null => "null",
			Node::Bool(_) => "bool",
			Node::Int(_) => "signed integer",
			Node::UInt(_) => "unsigned integer",
			Node::Float(_) => "float",
			Node::Date(_) => "date",
			Node::String(_) => "string",
			Node::Bytes(_) => "bytes",
			Node::Array(_) => "array",
			Node::Dict(_) => "dictionary",
			Node::Object(_) => "object",
		}
	}

	/// Error for a node that cannot restore into `target`.
	pub fn mismatch(&self, target: Shape) -> ArchiveError {
		match self {
			Node::Object(object) if object.kind == ClassKind::Unknown => ArchiveError::UnknownClassReference {
				class: object.class.to_owned(),
			},
			Node::Object(object) => ArchiveError::ClassShapeMismatch {
				class: object.class.to_owned(),
				target,
			},
			other => ArchiveError::TypeMismatch {
				expected: target,
				got: other.kind(),
			},
		}
	}

	/// Owned copy of the node; nested references are kept, not followed.
	pub fn to_value(&self) -> Value {
		match self {
			Node::Null => Value::Null,
			Node::Bool(value) => Value::Bool(*value),
			Node::Int(value) => Value::I64(*value),
			Node::UInt(value) => Value::U64(*value),
			Node::Float(value) => Value::F64(*value),
			Node::Date(offset) => Value::Date(*offset),
			Node::String(text) => Value::from(*text),
			Node::Bytes(bytes) => Value::Bytes(bytes.to_vec()),
			Node::Array(items) => Value::Array(items.to_vec()),
			Node::Dict(dict) => Value::Dict((*dict).clone()),
			Node::Object(object) => Value::Dict(object.dict.clone()),
		}
	}
}

/// Walks an [`ObjectGraph`] and restores values into [`Field`] targets.
///
/// References on the active decode path are tracked, so cycles fail with
/// [`ArchiveError::CyclicReference`] instead of recursing forever.
pub struct Decoder<'g> {
	graph: &'g ObjectGraph,
	types: &'g TypeRegistry,
	classes: &'g ClassTable,
	options: &'g DecodeOptions,
	active: HashSet<Uid>,
	depth: u32,
	restored: usize,
}

impl<'g> Decoder<'g> {
	/// Decoder over `graph` using shared registries.
	pub fn new(graph: &'g ObjectGraph, types: &'g TypeRegistry, classes: &'g ClassTable, options: &'g DecodeOptions) -> Self {
		Self {
			graph,
			types,
			classes,
			options,
			active: HashSet::new(),
			depth: 0,
			restored: 0,
		}
	}

	/// Restore the graph root into `target`.
	pub fn decode_root(&mut self, target: &mut dyn Field) -> Result<()> {
		self.decode_ref(self.graph.root, target)
	}

	/// Restore `value` into `target`, following references.
	pub fn decode_value(&mut self, value: &'g Value, target: &mut dyn Field) -> Result<()> {
		if let Value::Ref(uid) = value {
			return self.decode_ref(*uid, target);
		}
		if self.depth >= self.options.max_depth {
			return Err(ArchiveError::DepthExceeded {
				max_depth: self.options.max_depth,
			});
		}
		self.restored += 1;
		if self.restored > self.options.max_values {
			return Err(ArchiveError::BudgetExceeded {
				max_values: self.options.max_values,
			});
		}

		let node = self.node(value)?;
		self.depth += 1;
		let restored = target.restore(self, node);
		self.depth -= 1;
		restored
	}

	/// Restore the object at `uid` into `target`.
	pub fn decode_ref(&mut self, uid: Uid, target: &mut dyn Field) -> Result<()> {
		let graph = self.graph;
		let value = graph.get(uid)?;
		if uid == Uid::NULL && value.is_null_marker() {
			return target.restore(self, Node::Null);
		}
		if !self.active.insert(uid) {
			return Err(ArchiveError::CyclicReference { index: uid.get() });
		}

		let restored = self.decode_value(value, target);
		self.active.remove(&uid);
		restored
	}

	/// Follow a chain of references to a concrete value without decoding it.
	pub fn resolve(&self, mut value: &'g Value) -> Result<&'g Value> {
		let graph = self.graph;
		let mut hops = 0;
		while let Value::Ref(uid) = value {
			if hops > graph.len() {
				return Err(ArchiveError::CyclicReference { index: uid.get() });
			}
			value = graph.get(*uid)?;
			hops += 1;
		}
		Ok(value)
	}

	/// Classify a concrete value.
	pub fn node(&self, value: &'g Value) -> Result<Node<'g>> {
		Ok(match value {
			Value::Null => Node::Null,
			Value::Bool(value) => Node::Bool(*value),
			Value::I64(value) => Node::Int(*value),
			Value::U64(value) => Node::UInt(*value),
			Value::F64(value) => Node::Float(*value),
			Value::Date(offset) => Node::Date(*offset),
			Value::String(text) => Node::String(text),
			Value::Bytes(bytes) => Node::Bytes(bytes),
			Value::Array(items) => Node::Array(items),
			Value::Ref(_) => return self.node(self.resolve(value)?),
			Value::Dict(dict) => match dict.get(CLASS_KEY) {
				Some(class_ref) => Node::Object(self.object(dict, class_ref)?),
				None => Node::Dict(dict),
			},
		})
	}

	fn object(&self, dict: &'g Dictionary, class_ref: &'g Value) -> Result<Object<'g>> {
		let unknown = |class: String| ArchiveError::UnknownClassReference { class };
		if !matches!(class_ref, Value::Ref(_)) {
			return Err(unknown(format!("<{}>", class_ref.kind())));
		}

		let descriptor = self.resolve(class_ref)?;
		let Some(class) = descriptor.as_dict().and_then(|desc| desc.get(CLASS_NAME_KEY)).and_then(Value::as_str) else {
			return Err(unknown(format!("<{}>", descriptor.kind())));
		};

		Ok(Object {
			class,
			kind: self.classes.classify_name(class),
			dict,
		})
	}

	fn payload(&self, object: &Object<'g>, key: &'static str) -> Result<&'g Value> {
		let entry = object.dict.get(key).ok_or_else(|| ArchiveError::MissingWrapperField {
			class: object.class.to_owned(),
			field: key,
		})?;
		self.resolve(entry)
	}

	fn payload_array(&self, object: &Object<'g>, key: &'static str) -> Result<&'g [Value]> {
		match self.payload(object, key)? {
			Value::Array(items) => Ok(items),
			other => Err(ArchiveError::TypeMismatch {
				expected: Shape::Sequence,
				got: other.kind(),
			}),
		}
	}

	fn payload_bytes(&self, object: &Object<'g>, key: &'static str) -> Result<&'g [u8]> {
		match self.payload(object, key)? {
			Value::Bytes(bytes) => Ok(bytes),
			other => Err(ArchiveError::TypeMismatch {
				expected: Shape::Bytes,
				got: other.kind(),
			}),
		}
	}

	/// Element values of an ordered collection.
	pub fn collection_items(&self, object: &Object<'g>) -> Result<&'g [Value]> {
		self.payload_array(object, OBJECTS_KEY)
	}

	/// Key/value pairs of a key/value collection, keys resolved to strings.
	pub fn table_entries(&self, object: &Object<'g>) -> Result<Vec<(&'g str, &'g Value)>> {
		let keys = self.payload_array(object, KEYS_KEY)?;
		let values = self.payload_array(object, OBJECTS_KEY)?;
		if keys.len() != values.len() {
			return Err(ArchiveError::MismatchedTable {
				keys: keys.len(),
				objects: values.len(),
			});
		}

		keys.iter()
			.zip(values)
			.map(|(key, value)| match self.resolve(key)? {
				Value::String(text) => Ok((&**text, value)),
				other => Err(ArchiveError::TypeMismatch {
					expected: Shape::String,
					got: other.kind(),
				}),
			})
			.collect()
	}

	/// Payload bytes of a byte blob.
	pub fn blob_payload(&self, object: &Object<'g>) -> Result<&'g [u8]> {
		self.payload_bytes(object, DATA_KEY)
	}

	/// Payload bytes of a unique identifier.
	pub fn identifier_bytes(&self, object: &Object<'g>) -> Result<&'g [u8]> {
		self.payload_bytes(object, UUID_BYTES_KEY)
	}

	/// Reference-epoch offset of a timestamp; integer offsets are accepted.
	pub fn timestamp_offset(&self, object: &Object<'g>) -> Result<f64> {
		match self.payload(object, TIME_KEY)? {
			Value::F64(offset) => Ok(*offset),
			Value::I64(offset) => Ok(*offset as f64),
			Value::U64(offset) => Ok(*offset as f64),
			other => Err(ArchiveError::TypeMismatch {
				expected: Shape::Float,
				got: other.kind(),
			}),
		}
	}

	/// Restore a record from a key/value collection, a custom-class object, or a plain mapping.
	pub fn restore_record<R: Record>(&mut self, record: &mut R, node: Node<'g>) -> Result<()> {
		match node {
			Node::Null => Ok(()),
			Node::Object(object) if object.kind == ClassKind::KeyValueCollection => {
				let entries: HashMap<&'g str, &'g Value> = self.table_entries(&object)?.into_iter().collect();
				self.fill_record(record, |name| entries.get(name).copied())
			}
			Node::Object(object) if object.kind == ClassKind::Custom => self.fill_record(record, |name| object.dict.get(name)),
			Node::Dict(dict) => self.fill_record(record, |name| dict.get(name)),
			other => Err(other.mismatch(record.shape())),
		}
	}

	fn fill_record<R: Record>(&mut self, record: &mut R, lookup: impl Fn(&str) -> Option<&'g Value>) -> Result<()> {
		let descriptor = self.types.describe::<R>();

		for field in &descriptor.fields {
			let Some(value) = lookup(&*field.name) else {
				if field.omit_if_absent {
					continue;
				}
				if self.options.strict_fields {
					return Err(ArchiveError::MissingField {
						type_name: descriptor.type_name,
						field: field.name.to_string(),
					});
				}
				tracing::trace!(record = descriptor.type_name, field = %field.name, "field absent from archive, keeping default");
				continue;
			};

			let Some(slot) = field_by_path_mut(&mut *record, &field.path) else {
				continue;
			};
			self.decode_value(value, slot)?;
		}

		Ok(())
	}
}

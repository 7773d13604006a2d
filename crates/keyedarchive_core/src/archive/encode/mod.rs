use std::any::TypeId;

use crate::archive::class::{CLASS_KEY, DATA_KEY, KEYS_KEY, OBJECTS_KEY, TIME_KEY, UUID_BYTES_KEY};
use crate::archive::{
	ArchiveError, ClassDescriptor, ClassKind, ClassTable, Dictionary, Field, NULL_MARKER, ObjectGraph, Record, Result, TypeRegistry, Uid,
	Value, field_by_path,
};

/// Name reported for the top-level value in nil-field errors.
const ROOT_LABEL: &str = "$root";

/// Flattens a value tree into an object table.
///
/// Index 0 always holds the `$null` marker. Structurally equal objects are stored once;
/// the first inserted copy keeps its index.
pub struct Encoder<'a> {
	objects: Vec<Value>,
	types: &'a TypeRegistry,
	classes: &'a ClassTable,
	path: Vec<String>,
}

impl<'a> Encoder<'a> {
	/// Encoder with a table holding only the `$null` marker.
	pub fn new(types: &'a TypeRegistry, classes: &'a ClassTable) -> Self {
		Self {
			objects: vec![Value::from(NULL_MARKER)],
			types,
			classes,
			path: Vec::new(),
		}
	}

	/// Flatten `value` as the graph root and hand back the finished table.
	pub fn encode_root(mut self, value: &dyn Field) -> Result<ObjectGraph> {
		if value.is_absent() {
			return Err(ArchiveError::NonOmittableNil { field: ROOT_LABEL.to_owned() });
		}

		let root = value.flatten(&mut self)?;
		tracing::debug!(objects = self.objects.len(), root = root.get(), "flattened object graph");
		Ok(ObjectGraph { objects: self.objects, root })
	}

	/// Dotted path of the field currently being flattened.
	pub fn current_path(&self) -> String {
		if self.path.is_empty() {
			return ROOT_LABEL.to_owned();
		}
		self.path.join(".")
	}

	/// Append `value` unless an equal object is already present.
	pub fn add_object(&mut self, value: Value) -> Uid {
		if let Some(index) = self.objects.iter().position(|existing| *existing == value) {
			return Uid(index as u64);
		}
		self.objects.push(value);
		Uid(self.objects.len() as u64 - 1)
	}

	/// Append a string scalar; the `$null` marker text always maps to index 0.
	pub fn add_string(&mut self, text: &str) -> Uid {
		if text == NULL_MARKER {
			return Uid::NULL;
		}
		self.add_object(Value::from(text))
	}

	/// Append a class descriptor object.
	pub fn add_class(&mut self, descriptor: &ClassDescriptor) -> Uid {
		self.add_object(descriptor.to_value())
	}

	fn add_wrapper(&mut self, kind: ClassKind, entries: Vec<(&'static str, Value)>) -> Uid {
		let mut dict: Dictionary = entries.into_iter().collect();
		if let Some(descriptor) = ClassDescriptor::builtin(kind) {
			let class = self.add_class(&descriptor);
			dict.insert(CLASS_KEY, Value::Ref(class));
		}
		self.add_object(Value::Dict(dict))
	}

	/// Append a byte-blob wrapper.
	pub fn encode_bytes(&mut self, bytes: &[u8]) -> Uid {
		self.add_wrapper(ClassKind::ByteBlob, vec![(DATA_KEY, Value::Bytes(bytes.to_vec()))])
	}

	/// Append a timestamp wrapper holding a reference-epoch offset.
	pub fn encode_timestamp(&mut self, offset: f64) -> Uid {
		self.add_wrapper(ClassKind::Timestamp, vec![(TIME_KEY, Value::F64(offset))])
	}

	/// Append a unique-identifier wrapper.
	pub fn encode_identifier(&mut self, bytes: &[u8; 16]) -> Uid {
		self.add_wrapper(ClassKind::UniqueIdentifier, vec![(UUID_BYTES_KEY, Value::Bytes(bytes.to_vec()))])
	}

	/// Append an ordered-collection wrapper after flattening every element.
	pub fn encode_sequence<'v>(&mut self, items: impl IntoIterator<Item = &'v dyn Field>) -> Result<Uid> {
		let mut refs = Vec::new();
		for (index, item) in items.into_iter().enumerate() {
			let uid = self.encode_child(format!("[{index}]"), item)?;
			refs.push(Value::Ref(uid));
		}
		Ok(self.add_wrapper(ClassKind::OrderedCollection, vec![(OBJECTS_KEY, Value::Array(refs))]))
	}

	/// Append a key/value-collection wrapper; each value is flattened before its key.
	pub fn encode_table<'v>(&mut self, entries: impl IntoIterator<Item = (&'v str, &'v dyn Field)>) -> Result<Uid> {
		let mut keys = Vec::new();
		let mut values = Vec::new();
		for (key, value) in entries {
			values.push(Value::Ref(self.encode_child(key.to_owned(), value)?));
			keys.push(Value::Ref(self.add_object(Value::from(key))));
		}
		Ok(self.add_table(keys, values))
	}

	fn add_table(&mut self, keys: Vec<Value>, values: Vec<Value>) -> Uid {
		self.add_wrapper(
			ClassKind::KeyValueCollection,
			vec![(KEYS_KEY, Value::Array(keys)), (OBJECTS_KEY, Value::Array(values))],
		)
	}

	/// Append a record, either as a key/value collection or as a flat custom-class object.
	pub fn encode_record<R: Record>(&mut self, record: &R) -> Result<Uid> {
		let descriptor = self.types.describe::<R>();
		let custom = self.classes.custom_for(TypeId::of::<R>());

		let mut keys = Vec::new();
		let mut values = Vec::new();
		let mut flat = Dictionary::new();

		for field in &descriptor.fields {
			let Some(slot) = field_by_path(record, &field.path).filter(|slot| !slot.is_absent()) else {
				if field.omit_if_absent {
					continue;
				}
				self.path.push(field.name.to_string());
				let err = ArchiveError::NonOmittableNil { field: self.current_path() };
				self.path.pop();
				return Err(err);
			};

			let uid = self.encode_child(field.name.to_string(), slot)?;
			if custom.is_some() {
				flat.insert(field.name.clone(), Value::Ref(uid));
			} else {
				values.push(Value::Ref(uid));
				keys.push(Value::Ref(self.add_object(Value::from(&*field.name))));
			}
		}

		match custom {
			Some(class) => {
				let class = self.add_class(&class);
				flat.insert(CLASS_KEY, Value::Ref(class));
				Ok(self.add_object(Value::Dict(flat)))
			}
			None => Ok(self.add_table(keys, values)),
		}
	}

	fn encode_child(&mut self, label: String, field: &dyn Field) -> Result<Uid> {
		self.path.push(label);
		let flattened = if field.is_absent() {
			Err(ArchiveError::NonOmittableNil { field: self.current_path() })
		} else {
			field.flatten(self)
		};
		self.path.pop();
		flattened
	}
}

use std::fmt;

/// Marker string stored at index 0 of every archive produced by the encoder.
pub const NULL_MARKER: &str = "$null";

/// Index into an object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(pub u64);

impl Uid {
	/// Reference to the `$null` sentinel.
	pub const NULL: Uid = Uid(0);

	/// Raw index value.
	pub fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for Uid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Generic plist unit stored in an object table.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
	/// Explicit null, never written by the encoder.
	#[default]
	Null,
	/// Boolean scalar.
	Bool(bool),
	/// Signed integer scalar.
	I64(i64),
	/// Unsigned integer scalar.
	U64(u64),
	/// Floating point scalar.
	F64(f64),
	/// Plain plist date, as seconds from the reference epoch.
	Date(f64),
	/// UTF-8 string.
	String(Box<str>),
	/// Opaque byte payload.
	Bytes(Vec<u8>),
	/// Reference to another object table entry.
	Ref(Uid),
	/// Ordered sequence.
	Array(Vec<Value>),
	/// String-keyed mapping.
	Dict(Dictionary),
}

impl Value {
	/// Stable label for the value kind, used in diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::I64(_) => "signed integer",
			Value::U64(_) => "unsigned integer",
			Value::F64(_) => "float",
			Value::Date(_) => "date",
			Value::String(_) => "string",
			Value::Bytes(_) => "bytes",
			Value::Ref(_) => "reference",
			Value::Array(_) => "array",
			Value::Dict(_) => "dictionary",
		}
	}

	/// Whether this is the `$null` sentinel string.
	pub fn is_null_marker(&self) -> bool {
		matches!(self, Value::String(text) if text.as_ref() == NULL_MARKER)
	}

	/// Borrow string contents.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(text) => Some(text),
			_ => None,
		}
	}

	/// Read a reference.
	pub fn as_ref_uid(&self) -> Option<Uid> {
		match self {
			Value::Ref(uid) => Some(*uid),
			_ => None,
		}
	}

	/// Borrow mapping contents.
	pub fn as_dict(&self) -> Option<&Dictionary> {
		match self {
			Value::Dict(dict) => Some(dict),
			_ => None,
		}
	}

	/// Borrow sequence contents.
	pub fn as_array(&self) -> Option<&[Value]> {
		match self {
			Value::Array(items) => Some(items),
			_ => None,
		}
	}

	/// Visit every reference nested in this value, without following them.
	pub fn for_each_ref(&self, visit: &mut impl FnMut(Uid)) {
		match self {
			Value::Ref(uid) => visit(*uid),
			Value::Array(items) => items.iter().for_each(|item| item.for_each_ref(visit)),
			Value::Dict(dict) => dict.values().for_each(|item| item.for_each_ref(visit)),
			_ => {}
		}
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::String(value.into())
	}
}

/// Insertion-ordered string-keyed mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
	entries: Vec<(Box<str>, Value)>,
}

impl Dictionary {
	/// Empty mapping.
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert or replace an entry, keeping the original position on replace.
	pub fn insert(&mut self, key: impl Into<Box<str>>, value: Value) {
		let key = key.into();
		if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
			slot.1 = value;
			return;
		}
		self.entries.push((key, value));
	}

	/// Look up an entry by key.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.entries.iter().find(|(existing, _)| existing.as_ref() == key).map(|(_, value)| value)
	}

	/// Whether the key is present.
	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Iterate entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.entries.iter().map(|(key, value)| (key.as_ref(), value))
	}

	/// Iterate values in insertion order.
	pub fn values(&self) -> impl Iterator<Item = &Value> {
		self.entries.iter().map(|(_, value)| value)
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the mapping has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl<K: Into<Box<str>>> FromIterator<(K, Value)> for Dictionary {
	fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
		let mut dict = Dictionary::new();
		for (key, value) in iter {
			dict.insert(key, value);
		}
		dict
	}
}

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::archive::{Dictionary, Value};

/// Key holding the class reference on every archived object.
pub const CLASS_KEY: &str = "$class";
/// Key holding the class name on a class descriptor object.
pub const CLASS_NAME_KEY: &str = "$classname";
/// Key holding the ancestry chain on a class descriptor object.
pub const CLASS_CHAIN_KEY: &str = "$classes";

/// Element references of an ordered collection, or values of a key/value collection.
pub const OBJECTS_KEY: &str = "NS.objects";
/// Key references of a key/value collection.
pub const KEYS_KEY: &str = "NS.keys";
/// Payload of a byte blob.
pub const DATA_KEY: &str = "NS.data";
/// Reference-epoch offset of a timestamp.
pub const TIME_KEY: &str = "NS.time";
/// 16-byte payload of a unique identifier.
pub const UUID_BYTES_KEY: &str = "NS.uuidbytes";

/// Class name plus ancestry chain attached to archived objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassDescriptor {
	/// Concrete class name.
	pub name: String,
	/// Ancestry chain, most derived first.
	pub ancestry: Vec<String>,
}

impl ClassDescriptor {
	/// Build a descriptor from a name and chain.
	pub fn new<S: Into<String>>(name: impl Into<String>, ancestry: impl IntoIterator<Item = S>) -> Self {
		Self {
			name: name.into(),
			ancestry: ancestry.into_iter().map(Into::into).collect(),
		}
	}

	/// Descriptor the encoder writes for the given built-in kind.
	pub fn builtin(kind: ClassKind) -> Option<Self> {
		let (name, chain): (&str, &[&str]) = match kind {
			ClassKind::OrderedCollection => ("NSMutableArray", &["NSMutableArray", "NSArray", "NSObject"]),
			ClassKind::KeyValueCollection => ("NSMutableDictionary", &["NSMutableDictionary", "NSDictionary", "NSObject"]),
			ClassKind::ByteBlob => ("NSMutableData", &["NSMutableData", "NSData", "NSObject"]),
			ClassKind::Timestamp => ("NSDate", &["NSDate", "NSObject"]),
			ClassKind::UniqueIdentifier => ("NSUUID", &["NSUUID", "NSObject"]),
			ClassKind::Custom | ClassKind::Unknown => return None,
		};
		Some(Self::new(name, chain.iter().copied()))
	}

	/// Read a descriptor from its archived mapping form.
	pub fn from_dict(dict: &Dictionary) -> Option<Self> {
		let name = dict.get(CLASS_NAME_KEY)?.as_str()?;
		let ancestry = match dict.get(CLASS_CHAIN_KEY) {
			Some(Value::Array(items)) => items.iter().map(|item| item.as_str().map(str::to_owned)).collect::<Option<Vec<_>>>()?,
			Some(_) => return None,
			None => Vec::new(),
		};
		Some(Self {
			name: name.to_owned(),
			ancestry,
		})
	}

	/// Archived mapping form of this descriptor.
	pub fn to_value(&self) -> Value {
		let mut dict = Dictionary::new();
		dict.insert(CLASS_NAME_KEY, Value::from(self.name.as_str()));
		dict.insert(
			CLASS_CHAIN_KEY,
			Value::Array(self.ancestry.iter().map(|item| Value::from(item.as_str())).collect()),
		);
		Value::Dict(dict)
	}
}

/// Semantic wrapper kind of an archived object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
	/// `NSArray` family.
	OrderedCollection,
	/// `NSDictionary` family.
	KeyValueCollection,
	/// `NSData` family.
	ByteBlob,
	/// `NSDate`.
	Timestamp,
	/// `NSUUID`.
	UniqueIdentifier,
	/// Name registered in a [`ClassTable`].
	Custom,
	/// Anything else.
	Unknown,
}

impl ClassKind {
	/// Classify a class name against the built-in set.
	pub fn of_name(name: &str) -> Self {
		match name {
			"NSArray" | "NSMutableArray" => Self::OrderedCollection,
			"NSDictionary" | "NSMutableDictionary" => Self::KeyValueCollection,
			"NSData" | "NSMutableData" => Self::ByteBlob,
			"NSDate" => Self::Timestamp,
			"NSUUID" => Self::UniqueIdentifier,
			_ => Self::Unknown,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::OrderedCollection => "ordered-collection",
			Self::KeyValueCollection => "key/value-collection",
			Self::ByteBlob => "byte-blob",
			Self::Timestamp => "timestamp",
			Self::UniqueIdentifier => "unique-identifier",
			Self::Custom => "custom",
			Self::Unknown => "unknown",
		}
	}
}

#[derive(Debug, Default)]
struct Registrations {
	by_type: HashMap<TypeId, Arc<ClassDescriptor>>,
	by_name: HashMap<String, Arc<ClassDescriptor>>,
}

/// Custom class registrations layered over the built-in classification.
///
/// Entries are additive; registering the same type twice replaces the earlier descriptor.
#[derive(Debug, Default)]
pub struct ClassTable {
	inner: RwLock<Registrations>,
}

impl ClassTable {
	/// Empty table; only built-in classes are recognised.
	pub fn new() -> Self {
		Self::default()
	}

	/// Map an application type to a custom class descriptor.
	pub fn register(&self, type_id: TypeId, descriptor: ClassDescriptor) {
		tracing::debug!(class = %descriptor.name, chain = ?descriptor.ancestry, "registering custom class");
		let descriptor = Arc::new(descriptor);
		let mut inner = self.inner.write();
		inner.by_name.insert(descriptor.name.clone(), descriptor.clone());
		inner.by_type.insert(type_id, descriptor);
	}

	/// Custom descriptor registered for a type, if any.
	pub fn custom_for(&self, type_id: TypeId) -> Option<Arc<ClassDescriptor>> {
		self.inner.read().by_type.get(&type_id).cloned()
	}

	/// Whether a class name has been registered.
	pub fn is_registered_name(&self, name: &str) -> bool {
		self.inner.read().by_name.contains_key(name)
	}

	/// Classify a descriptor: built-ins first, then registered names.
	pub fn classify(&self, descriptor: &ClassDescriptor) -> ClassKind {
		self.classify_name(&descriptor.name)
	}

	/// Classify a bare class name.
	pub fn classify_name(&self, name: &str) -> ClassKind {
		match ClassKind::of_name(name) {
			ClassKind::Unknown if self.is_registered_name(name) => ClassKind::Custom,
			kind => kind,
		}
	}

	/// Number of registered custom classes.
	pub fn len(&self) -> usize {
		self.inner.read().by_type.len()
	}

	/// Whether no custom class has been registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

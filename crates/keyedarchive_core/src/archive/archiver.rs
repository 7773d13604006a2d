use std::any::TypeId;
use std::sync::Arc;

use crate::archive::codec::{self, Format};
use crate::archive::{ClassDescriptor, ClassTable, DecodeOptions, Decoder, Encoder, Field, ObjectGraph, Record, Result, TypeDescriptor, TypeRegistry};

/// Owned archiving context: one descriptor cache, one custom class table, one set of decode options.
///
/// `Archiver` is `Send + Sync`; share it behind `Arc` or borrow it across scoped threads.
/// Register custom classes during setup, before concurrent use.
#[derive(Debug, Default)]
pub struct Archiver {
	types: TypeRegistry,
	classes: ClassTable,
	options: DecodeOptions,
}

impl Archiver {
	/// Archiver with lenient decoding and no custom classes.
	pub fn new() -> Self {
		Self::default()
	}

	/// Archiver with explicit decode options.
	pub fn with_options(options: DecodeOptions) -> Self {
		Self {
			options,
			..Self::default()
		}
	}

	/// Active decode options.
	pub fn options(&self) -> &DecodeOptions {
		&self.options
	}

	/// Custom class table.
	pub fn classes(&self) -> &ClassTable {
		&self.classes
	}

	/// Archive `T` as a flat object of the named class instead of a dictionary.
	pub fn register_class<T: Record>(&self, name: &str, ancestry: &[&str]) {
		self.classes.register(TypeId::of::<T>(), ClassDescriptor::new(name, ancestry.iter().copied()));
	}

	/// Field metadata for a record type.
	pub fn describe<T: Record>(&self) -> Arc<TypeDescriptor> {
		self.types.describe::<T>()
	}

	/// Flatten a value into an object graph.
	pub fn flatten(&self, value: &dyn Field) -> Result<ObjectGraph> {
		Encoder::new(&self.types, &self.classes).encode_root(value)
	}

	/// Flatten a value and serialize it as a keyed archive.
	pub fn marshal(&self, value: &dyn Field, format: Format) -> Result<Vec<u8>> {
		let graph = self.flatten(value)?;
		codec::encode(&graph, format)
	}

	/// Restore `target` from a graph.
	pub fn unmarshal(&self, graph: &ObjectGraph, target: &mut dyn Field) -> Result<()> {
		Decoder::new(graph, &self.types, &self.classes, &self.options).decode_root(target)
	}

	/// Parse plist bytes and restore `target` from them.
	pub fn unmarshal_bytes(&self, bytes: &[u8], target: &mut dyn Field) -> Result<()> {
		let graph = codec::decode(bytes)?;
		self.unmarshal(&graph, target)
	}

	/// Build a fresh `T` from a graph.
	pub fn reconstruct<T: Field + Default>(&self, graph: &ObjectGraph) -> Result<T> {
		let mut target = T::default();
		self.unmarshal(graph, &mut target)?;
		Ok(target)
	}
}

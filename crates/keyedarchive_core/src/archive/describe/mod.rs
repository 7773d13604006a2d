use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::archive::Field;

/// Tag value that excludes a field from archiving.
const EXCLUDE_TAG: &str = "-";
/// Tag flag marking a field omit-if-absent.
const OMIT_FLAG: &str = "omitempty";

type DescribeFn = fn(&TypeRegistry) -> Arc<TypeDescriptor>;

/// One declared field of a [`Record`], in declaration order.
#[derive(Debug, Clone)]
pub struct FieldDecl {
	/// Rust field identifier.
	pub ident: &'static str,
	/// Archive tag: `name[,omitempty]`, or `-` to exclude.
	pub tag: Option<&'static str>,
	embed: Option<DescribeFn>,
}

impl FieldDecl {
	/// Field archived under its own identifier.
	pub fn plain() -> Self {
		Self {
			ident: "",
			tag: None,
			embed: None,
		}
	}

	/// Field archived according to a tag.
	pub fn tag(tag: &'static str) -> Self {
		Self {
			tag: Some(tag),
			..Self::plain()
		}
	}

	/// Anonymous embedding: the record's fields are spliced into the parent.
	pub fn embed<T: Record>() -> Self {
		Self {
			embed: Some(TypeRegistry::describe::<T>),
			..Self::plain()
		}
	}

	/// Attach the field identifier.
	pub fn ident(mut self, ident: &'static str) -> Self {
		self.ident = ident;
		self
	}

	/// Whether this is an embedding declaration.
	pub fn is_embedded(&self) -> bool {
		self.embed.is_some()
	}

	fn is_excluded(&self) -> bool {
		self.tag == Some(EXCLUDE_TAG)
	}

	fn parse_tag(&self) -> (&'static str, bool) {
		let Some(tag) = self.tag else {
			return (self.ident, false);
		};
		let mut tokens = tag.split(',');
		let name = tokens.next().filter(|name| !name.is_empty()).unwrap_or(self.ident);
		let omit = tokens.any(|flag| flag == OMIT_FLAG);
		(name, omit)
	}
}

/// Resolved archive metadata for one field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
	/// Archived key name.
	pub name: Box<str>,
	/// Skip the field on encode when absent, and do not require it on decode.
	pub omit_if_absent: bool,
	/// Field indices from the outer record through embeddings.
	pub path: Vec<usize>,
}

/// Ordered field metadata for one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
	/// Rust type name.
	pub type_name: &'static str,
	/// Fields in archive order.
	pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
	/// Descriptor with no fields.
	pub fn empty(type_name: &'static str) -> Self {
		Self {
			type_name,
			fields: Vec::new(),
		}
	}

	/// Look up a field by archived name.
	pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
		self.fields.iter().find(|field| field.name.as_ref() == name)
	}

	fn add_field(&mut self, candidate: FieldDescriptor) {
		let conflicts: Vec<usize> = self
			.fields
			.iter()
			.enumerate()
			.filter(|(_, existing)| existing.name == candidate.name)
			.map(|(index, _)| index)
			.collect();

		if conflicts.iter().any(|index| self.fields[*index].path.len() < candidate.path.len()) {
			return;
		}

		for index in conflicts.into_iter().rev() {
			self.fields.remove(index);
		}
		self.fields.push(candidate);
	}
}

/// Object-safe field access used to walk descriptor paths.
pub trait Fields {
	/// Borrow the field at a declaration index.
	fn field_at(&self, index: usize) -> Option<&dyn Field>;
	/// Mutably borrow the field at a declaration index.
	fn field_at_mut(&mut self, index: usize) -> Option<&mut dyn Field>;
}

/// Struct-shaped aggregate with declared, named fields.
///
/// Usually implemented through [`impl_record!`](crate::impl_record).
pub trait Record: Fields + Field + Default + 'static {
	/// Field declarations in declaration order.
	fn declare() -> Vec<FieldDecl>;

	/// Name used in diagnostics.
	fn record_name() -> &'static str {
		type_name::<Self>()
	}
}

/// Borrow the field reached by a descriptor path; `None` if an embedded optional is absent.
pub fn field_by_path<'r>(fields: &'r dyn Fields, path: &[usize]) -> Option<&'r dyn Field> {
	let (first, rest) = path.split_first()?;
	let field = fields.field_at(*first)?;
	if rest.is_empty() {
		return Some(field);
	}
	field_by_path(field.as_record()?, rest)
}

/// Mutably borrow the field reached by a descriptor path, allocating embedded optionals.
pub fn field_by_path_mut<'r>(fields: &'r mut dyn Fields, path: &[usize]) -> Option<&'r mut dyn Field> {
	let (first, rest) = path.split_first()?;
	let field = fields.field_at_mut(*first)?;
	if rest.is_empty() {
		return Some(field);
	}
	field_by_path_mut(field.as_record_mut()?, rest)
}

/// Memoized [`TypeDescriptor`]s keyed by type.
///
/// Concurrent first use may build a descriptor more than once; the first stored entry wins
/// and every caller receives a fully built descriptor.
#[derive(Debug, Default)]
pub struct TypeRegistry {
	cache: RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>,
}

impl TypeRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Describe a record type, building and caching on first use.
	pub fn describe<R: Record>(&self) -> Arc<TypeDescriptor> {
		let key = TypeId::of::<R>();
		if let Some(found) = self.cache.read().get(&key) {
			return found.clone();
		}

		let built = Arc::new(self.build(R::record_name(), R::declare()));
		tracing::trace!(record = built.type_name, fields = built.fields.len(), "built type descriptor");

		self.cache.write().entry(key).or_insert(built).clone()
	}

	/// Cached descriptor for a type; types never described yield an empty descriptor.
	pub fn lookup(&self, type_id: TypeId) -> Arc<TypeDescriptor> {
		self.cache
			.read()
			.get(&type_id)
			.cloned()
			.unwrap_or_else(|| Arc::new(TypeDescriptor::empty("<undescribed>")))
	}

	/// Number of cached descriptors.
	pub fn len(&self) -> usize {
		self.cache.read().len()
	}

	/// Whether nothing has been described yet.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn build(&self, type_name: &'static str, decls: Vec<FieldDecl>) -> TypeDescriptor {
		let mut descriptor = TypeDescriptor::empty(type_name);

		for (index, decl) in decls.iter().enumerate() {
			if decl.is_excluded() {
				continue;
			}

			if let Some(describe) = decl.embed {
				let inner = describe(self);
				for field in &inner.fields {
					let mut path = Vec::with_capacity(field.path.len() + 1);
					path.push(index);
					path.extend_from_slice(&field.path);
					descriptor.add_field(FieldDescriptor {
						name: field.name.clone(),
						omit_if_absent: field.omit_if_absent,
						path,
					});
				}
				continue;
			}

			let (name, omit_if_absent) = decl.parse_tag();
			descriptor.add_field(FieldDescriptor {
				name: name.into(),
				omit_if_absent,
				path: vec![index],
			});
		}

		descriptor
	}
}

#[cfg(test)]
mod tests;

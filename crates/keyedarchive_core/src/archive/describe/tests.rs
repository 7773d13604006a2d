use std::any::TypeId;
use std::sync::Arc;

use crate::archive::{FieldDecl, Record, TypeDescriptor, TypeRegistry, field_by_path, field_by_path_mut};
use crate::impl_record;

#[derive(Debug, Default)]
struct Flags {
	id: i64,
	label: String,
}

#[derive(Debug, Default)]
struct Tagged {
	flags: Flags,
	name: String,
	note: Option<String>,
	cache: String,
}

#[derive(Debug, Default)]
struct Shadowing {
	flags: Option<Flags>,
	id: String,
}

#[derive(Debug, Default)]
struct Left {
	shared: i64,
}

#[derive(Debug, Default)]
struct Right {
	shared: String,
}

#[derive(Debug, Default)]
struct SameDepth {
	left: Left,
	right: Right,
}

impl_record!(Flags {
	id => FieldDecl::plain(),
	label => FieldDecl::tag("Label,omitempty"),
});

impl_record!(Tagged {
	flags => FieldDecl::embed::<Flags>(),
	name => FieldDecl::tag("Name"),
	note => FieldDecl::tag(",omitempty"),
	cache => FieldDecl::tag("-"),
});

impl_record!(Shadowing {
	flags => FieldDecl::embed::<Flags>(),
	id => FieldDecl::plain(),
});

impl_record!(Left { shared => FieldDecl::plain() });
impl_record!(Right { shared => FieldDecl::plain() });
impl_record!(SameDepth {
	left => FieldDecl::embed::<Left>(),
	right => FieldDecl::embed::<Right>(),
});

fn names(descriptor: &TypeDescriptor) -> Vec<String> {
	descriptor.fields.iter().map(|field| field.name.to_string()).collect()
}

#[test]
fn tags_rename_exclude_and_mark_omittable() {
	let registry = TypeRegistry::new();
	let descriptor = registry.describe::<Tagged>();

	assert_eq!(names(&descriptor), ["id", "Label", "Name", "note"]);
	assert!(descriptor.field("cache").is_none());

	let note = descriptor.field("note").expect("note is archived");
	assert!(note.omit_if_absent);
	assert!(!descriptor.field("Name").expect("Name is archived").omit_if_absent);
	assert!(descriptor.field("Label").expect("Label is archived").omit_if_absent);
}

#[test]
fn embedded_fields_carry_prefixed_paths() {
	let registry = TypeRegistry::new();
	let descriptor = registry.describe::<Tagged>();

	assert_eq!(descriptor.field("id").expect("spliced").path, [0, 0]);
	assert_eq!(descriptor.field("Label").expect("spliced").path, [0, 1]);
	assert_eq!(descriptor.field("Name").expect("direct").path, [1]);
}

#[test]
fn shallower_field_shadows_embedded_one() {
	let registry = TypeRegistry::new();
	let descriptor = registry.describe::<Shadowing>();

	let id = descriptor.field("id").expect("id survives");
	assert_eq!(id.path, [1]);
	assert_eq!(descriptor.fields.iter().filter(|field| field.name.as_ref() == "id").count(), 1);
}

#[test]
fn equal_depth_conflict_keeps_later_declaration() {
	let registry = TypeRegistry::new();
	let descriptor = registry.describe::<SameDepth>();

	assert_eq!(descriptor.fields.len(), 1);
	assert_eq!(descriptor.fields[0].path, [1, 0]);
}

#[test]
fn paths_reach_and_vivify_embedded_optionals() {
	let registry = TypeRegistry::new();
	let descriptor = registry.describe::<Shadowing>();
	let label = descriptor.field("Label").expect("label spliced through optional embed");

	let mut record = Shadowing::default();
	assert!(field_by_path(&record, &label.path).is_none());

	let slot = field_by_path_mut(&mut record, &label.path).expect("optional embed is allocated");
	assert_eq!(slot.shape().to_string(), "string");
	assert!(record.flags.is_some());
}

#[test]
fn concurrent_first_use_yields_one_descriptor() {
	let registry = TypeRegistry::new();

	let described: Vec<_> = std::thread::scope(|scope| {
		let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| registry.describe::<Tagged>())).collect();
		handles.into_iter().map(|handle| handle.join().expect("describe thread")).collect()
	});

	let cached = registry.describe::<Tagged>();
	assert!(described.iter().all(|descriptor| Arc::ptr_eq(descriptor, &cached)));
	// Tagged embeds Flags, which is cached along the way.
	assert_eq!(registry.len(), 2);
}

#[test]
fn undescribed_lookup_is_empty() {
	let registry = TypeRegistry::new();
	assert!(registry.lookup(TypeId::of::<Tagged>()).fields.is_empty());

	registry.describe::<Tagged>();
	assert_eq!(registry.lookup(TypeId::of::<Tagged>()).fields.len(), 4);
	assert_eq!(Tagged::record_name(), "Tagged");
}

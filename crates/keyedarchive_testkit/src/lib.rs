//! Shared test helpers for workspace crates.

use std::path::{Path, PathBuf};

use plist::{Dictionary, Integer, Uid, Value};

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve the workspace target directory.
pub fn target_dir() -> PathBuf {
	std::env::var_os("CARGO_TARGET_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|| workspace_root().join("target"))
}

/// Write `bytes` to a per-test scratch file under the target directory and return its path.
pub fn scratch_file(name: &str, bytes: &[u8]) -> PathBuf {
	let dir = target_dir().join("keyedarchive-scratch");
	std::fs::create_dir_all(&dir).expect("create scratch dir");
	let path = dir.join(name);
	std::fs::write(&path, bytes).expect("write scratch file");
	path
}

fn class(name: &str, chain: &[&str]) -> Value {
	let mut dict = Dictionary::new();
	dict.insert("$classname".to_owned(), Value::String(name.to_owned()));
	dict.insert(
		"$classes".to_owned(),
		Value::Array(chain.iter().map(|item| Value::String((*item).to_owned())).collect()),
	);
	Value::Dictionary(dict)
}

fn uid(index: u64) -> Value {
	Value::Uid(Uid::new(index))
}

/// Objects of a keyed archive, as a Cocoa archiver would write them, for the record
/// `{ name: "widget", count: 3, tags: ["a", "b"] }`.
///
/// The top-level dictionary uses immutable class names and references its keys and
/// values through separate objects.
pub fn sample_objects() -> Vec<Value> {
	let mut tags = Dictionary::new();
	tags.insert("NS.objects".to_owned(), Value::Array(vec![uid(6), uid(7)]));
	tags.insert("$class".to_owned(), uid(8));

	let mut root = Dictionary::new();
	root.insert("NS.keys".to_owned(), Value::Array(vec![uid(2), uid(3), uid(4)]));
	root.insert("NS.objects".to_owned(), Value::Array(vec![uid(9), uid(10), uid(5)]));
	root.insert("$class".to_owned(), uid(11));

	vec![
		Value::String("$null".to_owned()),
		Value::Dictionary(root),
		Value::String("name".to_owned()),
		Value::String("count".to_owned()),
		Value::String("tags".to_owned()),
		Value::Dictionary(tags),
		Value::String("a".to_owned()),
		Value::String("b".to_owned()),
		class("NSArray", &["NSArray", "NSObject"]),
		Value::String("widget".to_owned()),
		Value::Integer(Integer::from(3)),
		class("NSDictionary", &["NSDictionary", "NSObject"]),
	]
}

/// Wrap an object table in a keyed-archive container rooted at `root`.
pub fn keyed_archive(objects: Vec<Value>, root: u64) -> Value {
	let mut top = Dictionary::new();
	top.insert("root".to_owned(), uid(root));

	let mut container = Dictionary::new();
	container.insert("$version".to_owned(), Value::Integer(Integer::from(100_000)));
	container.insert("$archiver".to_owned(), Value::String("NSKeyedArchiver".to_owned()));
	container.insert("$top".to_owned(), Value::Dictionary(top));
	container.insert("$objects".to_owned(), Value::Array(objects));
	Value::Dictionary(container)
}

/// Binary plist bytes of [`sample_objects`] in a keyed-archive container.
pub fn sample_keyed_archive() -> Vec<u8> {
	let mut out = Vec::new();
	keyed_archive(sample_objects(), 1).to_writer_binary(&mut out).expect("write sample archive");
	out
}

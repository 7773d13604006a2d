use std::collections::BTreeMap;
use std::path::PathBuf;

use keyedarchive::archive::{ClassKind, Result};

use crate::cmd::util::{class_of, load};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
}

/// Print container, root and class histogram.
pub fn run(args: Args) -> Result<()> {
	let Args { path } = args;

	let document = load(&path)?;
	let graph = &document.graph;

	let mut classes: BTreeMap<&str, usize> = BTreeMap::new();
	for object in &graph.objects {
		if let Some(class) = class_of(graph, object) {
			*classes.entry(class).or_default() += 1;
		}
	}

	println!("path: {}", path.display());
	println!("format: {}", document.format.as_str());
	println!("container: {}", document.container.as_str());
	println!("objects: {}", graph.len());
	println!("root: {}", graph.root);
	println!("root_kind: {}", graph.root_object()?.kind());
	if let Some(class) = graph.root_object().ok().and_then(|root| class_of(graph, root)) {
		println!("root_class: {class}");
	}

	let mut entries: Vec<_> = classes.into_iter().collect();
	entries.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));

	println!("classes:");
	for (class, count) in entries.into_iter().take(16) {
		println!("  {class}: {count} ({})", ClassKind::of_name(class).as_str());
	}

	Ok(())
}

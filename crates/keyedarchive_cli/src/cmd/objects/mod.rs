use std::path::PathBuf;

use keyedarchive::archive::{ObjectGraph, Result};

use crate::cmd::util::{class_of, emit_json, load, summarize};

const SUMMARY_LEN: usize = 60;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub limit: Option<usize>,
	#[arg(long)]
	pub json: bool,
}

/// List object table entries with kind, class and a short summary.
pub fn run(args: Args) -> Result<()> {
	let Args { path, limit, json } = args;

	let document = load(&path)?;
	let mut rows = object_rows(&document.graph);
	if let Some(max) = limit {
		rows.truncate(max);
	}

	if json {
		emit_json(&ObjectsJson {
			path: path.display().to_string(),
			root: document.graph.root.get(),
			count: document.graph.len(),
			objects: rows,
		});
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("objects: {}", document.graph.len());
	println!("root: {}", document.graph.root);
	println!("index\tkind\tclass\tsummary");
	for row in rows {
		println!("#{}\t{}\t{}\t{}", row.index, row.kind, row.class.as_deref().unwrap_or("-"), row.summary);
	}

	Ok(())
}

pub(crate) fn object_rows(graph: &ObjectGraph) -> Vec<ObjectJson> {
	graph
		.objects
		.iter()
		.enumerate()
		.map(|(index, object)| ObjectJson {
			index,
			kind: object.kind(),
			class: class_of(graph, object).map(str::to_owned),
			summary: summarize(graph, object, SUMMARY_LEN),
		})
		.collect()
}

#[derive(serde::Serialize)]
struct ObjectsJson {
	path: String,
	root: u64,
	count: usize,
	objects: Vec<ObjectJson>,
}

#[derive(Debug, serde::Serialize)]
pub(crate) struct ObjectJson {
	pub index: usize,
	pub kind: &'static str,
	pub class: Option<String>,
	pub summary: String,
}

use std::path::PathBuf;

use keyedarchive::archive::{PrintOptions, Result, render_with};

use crate::cmd::util::load;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub depth: Option<u32>,
	#[arg(long = "max-items")]
	pub max_items: Option<usize>,
	#[arg(long = "max-string")]
	pub max_string: Option<usize>,
	/// Stop expanding after this many printed values.
	#[arg(long = "max-nodes")]
	pub max_nodes: Option<usize>,
	/// Use the compact preset as the base.
	#[arg(long)]
	pub compact: bool,
}

/// Print the graph rooted at the archive root as an indented tree.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		depth,
		max_items,
		max_string,
		max_nodes,
		compact,
	} = args;

	let document = load(&path)?;

	let mut options = if compact { PrintOptions::compact() } else { PrintOptions::default() };
	if let Some(depth) = depth {
		options.max_depth = depth;
	}
	if let Some(max_items) = max_items {
		options.max_items = max_items;
	}
	if let Some(max_string) = max_string {
		options.max_string_len = max_string;
	}
	if let Some(max_nodes) = max_nodes {
		options.max_nodes = max_nodes;
	}

	println!("{}", render_with(&document.graph, &options));
	Ok(())
}

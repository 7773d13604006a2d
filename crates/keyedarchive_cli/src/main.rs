#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "keyedarchive", about = "Keyed archive inspection tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Summarize container, root and class usage.
	Info(cmd::info::Args),
	/// Render the object graph as an indented tree.
	Render(cmd::render::Args),
	/// List every entry of the object table.
	Objects(cmd::objects::Args),
	/// Re-encode a plist as binary or XML.
	Convert(cmd::convert::Args),
}

fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> keyedarchive::archive::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Render(args) => cmd::render::run(args),
		Commands::Objects(args) => cmd::objects::run(args),
		Commands::Convert(args) => cmd::convert::run(args),
	}
}

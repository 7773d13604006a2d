use std::path::PathBuf;

use keyedarchive::archive::{Format, Result};

use crate::cmd::util::load;

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum FormatArg {
	Binary,
	Xml,
}

impl From<FormatArg> for Format {
	fn from(value: FormatArg) -> Self {
		match value {
			FormatArg::Binary => Format::Binary,
			FormatArg::Xml => Format::Xml,
		}
	}
}

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub out: PathBuf,
	#[arg(long, value_enum, default_value = "binary")]
	pub format: FormatArg,
}

/// Re-encode a keyed archive or plain plist in the requested format.
pub fn run(args: Args) -> Result<()> {
	let Args { path, out, format } = args;
	let format = Format::from(format);

	let document = load(&path)?;
	let bytes = document.encode(format)?;
	std::fs::write(&out, &bytes)?;

	println!("wrote: {}", out.display());
	println!("format: {}", format.as_str());
	println!("container: {}", document.container.as_str());
	println!("bytes: {}", bytes.len());
	Ok(())
}

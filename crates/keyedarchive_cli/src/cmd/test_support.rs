use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

use keyedarchive_testkit::{sample_keyed_archive, scratch_file, target_dir};

const BIN_NAME: &str = if cfg!(windows) { "keyedarchive.exe" } else { "keyedarchive" };

static BIN: OnceLock<PathBuf> = OnceLock::new();

/// Write the testkit sample archive to a scratch file and return it as a command argument.
pub(crate) fn sample_archive_arg(name: &str) -> String {
	scratch_file(name, &sample_keyed_archive()).display().to_string()
}

pub(crate) fn run_keyedarchive(args: &[&str]) -> Output {
	Command::new(bin()).args(args).output().expect("keyedarchive command executes")
}

/// Stdout of a command that must succeed.
pub(crate) fn run_keyedarchive_text(args: &[&str]) -> String {
	let output = run_keyedarchive(args);
	assert!(
		output.status.success(),
		"keyedarchive {args:?} exited with {}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	String::from_utf8(output.stdout).expect("stdout should be utf-8")
}

pub(crate) fn run_keyedarchive_json(args: &[&str]) -> serde_json::Value {
	serde_json::from_str(&run_keyedarchive_text(args)).expect("stdout should be valid json")
}

fn bin() -> &'static Path {
	BIN.get_or_init(locate_bin)
}

/// Prefer the cargo-provided path, then a sibling of the test harness, then a fresh build.
fn locate_bin() -> PathBuf {
	if let Some(path) = std::env::var_os("CARGO_BIN_EXE_keyedarchive") {
		return PathBuf::from(path);
	}

	let sibling = std::env::current_exe()
		.ok()
		.and_then(|harness| harness.parent()?.parent().map(|profile| profile.join(BIN_NAME)));
	if let Some(path) = sibling.filter(|path| path.is_file()) {
		return path;
	}

	let status = Command::new("cargo")
		.current_dir(env!("CARGO_MANIFEST_DIR"))
		.args(["build", "--quiet", "--bin", "keyedarchive"])
		.status()
		.expect("cargo build executes");
	let built = target_dir().join("debug").join(BIN_NAME);
	assert!(status.success() && built.is_file(), "keyedarchive binary missing at {}", built.display());
	built
}

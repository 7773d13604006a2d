#![allow(missing_docs)]

use std::path::Path;
use std::process::{Command, Output};
use std::time::{Duration, UNIX_EPOCH};

use keyedarchive_testkit::{keyed_archive, sample_keyed_archive, sample_objects, scratch_file, target_dir};

fn run(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_keyedarchive")).args(args).output().expect("keyedarchive command executes")
}

fn run_ok(args: &[&str]) -> String {
	let output = run(args);
	assert!(
		output.status.success(),
		"keyedarchive command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	String::from_utf8(output.stdout).expect("stdout should be utf-8")
}

fn arg(path: &Path) -> String {
	path.display().to_string()
}

#[test]
fn info_reports_container_and_classes() {
	let path = scratch_file("cli_info.plist", &sample_keyed_archive());
	let stdout = run_ok(&["info", &arg(&path)]);

	assert!(stdout.contains("format: binary"), "{stdout}");
	assert!(stdout.contains("container: keyed_archive"), "{stdout}");
	assert!(stdout.contains("objects: 12"), "{stdout}");
	assert!(stdout.contains("root: #1"), "{stdout}");
	assert!(stdout.contains("root_class: NSDictionary"), "{stdout}");
	assert!(stdout.contains("  NSArray: 1 (ordered-collection)"), "{stdout}");
}

#[test]
fn render_prints_tree_and_respects_depth() {
	let path = scratch_file("cli_render.plist", &sample_keyed_archive());

	let full = run_ok(&["render", &arg(&path)]);
	assert!(full.contains("[name]: string(widget)"), "{full}");
	assert!(full.contains("[0]: string(a)"), "{full}");

	let shallow = run_ok(&["render", &arg(&path), "--depth", "0"]);
	assert_eq!(shallow.trim_end(), "struct{...}");
}

#[test]
fn convert_to_xml_and_back_preserves_graph() {
	let path = scratch_file("cli_convert_in.plist", &sample_keyed_archive());
	let xml = target_dir().join("keyedarchive-scratch").join("cli_convert_out.xml");
	let binary = target_dir().join("keyedarchive-scratch").join("cli_convert_back.plist");

	let stdout = run_ok(&["convert", &arg(&path), "--out", &arg(&xml), "--format", "xml"]);
	assert!(stdout.contains("format: xml"), "{stdout}");
	let text = std::fs::read_to_string(&xml).expect("read xml output");
	assert!(text.contains("NSKeyedArchiver"), "{text}");
	assert!(text.contains("CF$UID"), "{text}");

	run_ok(&["convert", &arg(&xml), "--out", &arg(&binary)]);
	let info = run_ok(&["info", &arg(&binary)]);
	assert!(info.contains("format: binary"), "{info}");
	assert!(info.contains("objects: 12"), "{info}");
}

#[test]
fn plain_plist_is_reported_as_plain() {
	let mut bytes = Vec::new();
	plist::Value::Array(vec![plist::Value::from("x"), plist::Value::from(true)])
		.to_writer_xml(&mut bytes)
		.expect("write plain plist");
	let path = scratch_file("cli_plain.plist", &bytes);

	let info = run_ok(&["info", &arg(&path)]);
	assert!(info.contains("format: xml"), "{info}");
	assert!(info.contains("container: plain"), "{info}");
	assert!(info.contains("objects: 1"), "{info}");

	let render = run_ok(&["render", &arg(&path)]);
	assert!(render.contains("[1]: bool(true)"), "{render}");
}

#[test]
fn convert_keeps_dates_in_plain_plists() {
	let mut dict = plist::Dictionary::new();
	dict.insert("title".to_owned(), plist::Value::from("launch"));
	dict.insert("when".to_owned(), plist::Value::Date(plist::Date::from(UNIX_EPOCH + Duration::from_secs(1_700_000_000))));
	let source = plist::Value::Dictionary(dict);
	let mut bytes = Vec::new();
	source.to_writer_xml(&mut bytes).expect("write dated plist");
	let path = scratch_file("cli_dated.plist", &bytes);
	let binary = target_dir().join("keyedarchive-scratch").join("cli_dated.bplist");
	let xml = target_dir().join("keyedarchive-scratch").join("cli_dated_back.xml");

	let stdout = run_ok(&["convert", &arg(&path), "--out", &arg(&binary)]);
	assert!(stdout.contains("container: plain"), "{stdout}");
	run_ok(&["convert", &arg(&binary), "--out", &arg(&xml), "--format", "xml"]);

	let text = std::fs::read_to_string(&xml).expect("read xml output");
	assert!(text.contains("<date>2023-11-14T22:13:20Z</date>"), "{text}");
	assert!(!text.contains("<real>"), "{text}");
	let reread = plist::Value::from_file(&xml).expect("reparse converted plist");
	assert_eq!(reread, source);
}

#[test]
fn keyed_archive_without_null_slot_keeps_its_container() {
	let mut objects = sample_objects();
	objects[0] = plist::Value::from("placeholder");
	let mut bytes = Vec::new();
	keyed_archive(objects, 1).to_writer_binary(&mut bytes).expect("write archive");
	let path = scratch_file("cli_no_null.plist", &bytes);
	let xml = target_dir().join("keyedarchive-scratch").join("cli_no_null.xml");

	let info = run_ok(&["info", &arg(&path)]);
	assert!(info.contains("container: keyed_archive"), "{info}");

	let stdout = run_ok(&["convert", &arg(&path), "--out", &arg(&xml), "--format", "xml"]);
	assert!(stdout.contains("container: keyed_archive"), "{stdout}");
	let converted = run_ok(&["info", &arg(&xml)]);
	assert!(converted.contains("container: keyed_archive"), "{converted}");
	assert!(converted.contains("objects: 12"), "{converted}");
}

#[test]
fn render_caps_output_with_node_budget() {
	let path = scratch_file("cli_render_budget.plist", &sample_keyed_archive());
	let stdout = run_ok(&["render", &arg(&path), "--max-nodes", "2"]);
	assert!(stdout.contains("..."), "{stdout}");
	assert!(!stdout.contains("string(b)"), "{stdout}");
}

#[test]
fn failures_exit_with_error_message() {
	let path = scratch_file("cli_garbage.plist", b"bplist00\x00\x01garbage");
	let output = run(&["info", &arg(&path)]);

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.starts_with("error: "), "{stderr}");

	let missing = run(&["render", "/nonexistent/keyedarchive.plist"]);
	assert!(!missing.status.success());
	assert!(String::from_utf8_lossy(&missing.stderr).contains("error: io:"));
}

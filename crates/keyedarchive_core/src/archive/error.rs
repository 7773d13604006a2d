use thiserror::Error;

use crate::archive::Shape;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors produced while flattening, reconstructing, and serializing object graphs.
#[derive(Debug, Error)]
pub enum ArchiveError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Byte-level plist codec failure.
	#[error("plist: {0}")]
	Plist(#[from] plist::Error),
	/// Plist looked like a keyed archive but its container was malformed.
	#[error("malformed keyed archive: {reason}")]
	NotKeyedArchive {
		/// What part of the container was missing or mistyped.
		reason: &'static str,
	},
	/// Primitive kind of a decoded value disagrees with the target.
	#[error("type mismatch: expected {expected}, got {got}")]
	TypeMismatch {
		/// Target shape.
		expected: Shape,
		/// Kind of the decoded value.
		got: &'static str,
	},
	/// Decoded integer does not fit the target integer type.
	#[error("integer {value} out of range for {target}")]
	IntegerOutOfRange {
		/// Decoded value, widened for display.
		value: i128,
		/// Target shape.
		target: Shape,
	},
	/// Class-tagged mapping cannot be reconstructed into the requested shape.
	#[error("class {class} cannot decode into {target}")]
	ClassShapeMismatch {
		/// Class name carried by the mapping.
		class: String,
		/// Target shape.
		target: Shape,
	},
	/// `$class` did not resolve to a known class descriptor.
	#[error("unknown class reference: {class}")]
	UnknownClassReference {
		/// Class name, or the raw reference when no descriptor could be read.
		class: String,
	},
	/// Wrapper object lacks one of its payload entries.
	#[error("{class} object is missing {field}")]
	MissingWrapperField {
		/// Wrapper class name.
		class: String,
		/// Payload key that was expected.
		field: &'static str,
	},
	/// Key/value collection has differently sized key and object arrays.
	#[error("key/value collection has {keys} keys but {objects} objects")]
	MismatchedTable {
		/// Number of keys.
		keys: usize,
		/// Number of objects.
		objects: usize,
	},
	/// Identifier payload was not exactly 16 bytes.
	#[error("identifier payload must be 16 bytes, got {len}")]
	InvalidIdentifier {
		/// Payload length.
		len: usize,
	},
	/// Timestamp offset cannot be represented as an instant.
	#[error("timestamp offset {offset} is out of range")]
	TimestampOutOfRange {
		/// Seconds relative to the reference epoch.
		offset: f64,
	},
	/// Strict decoding found no entry for a required field.
	#[error("missing required field {field} on {type_name}")]
	MissingField {
		/// Record type name.
		type_name: &'static str,
		/// Field tag name.
		field: String,
	},
	/// Encoder met an absent value in a field that is not omit-if-absent.
	#[error("nil value in non-omittable field {field}")]
	NonOmittableNil {
		/// Dotted field path.
		field: String,
	},
	/// Encoder met a value with no archive representation.
	#[error("unsupported kind: {kind}")]
	UnsupportedKind {
		/// Kind label.
		kind: &'static str,
	},
	/// Reference index outside the object table.
	#[error("invalid reference #{index} (object count {len})")]
	InvalidReference {
		/// Offending index.
		index: u64,
		/// Object table length.
		len: usize,
	},
	/// Reference revisited while it was still being decoded.
	#[error("cyclic reference at #{index}")]
	CyclicReference {
		/// Index that closed the cycle.
		index: u64,
	},
	/// Decoder nesting exceeded the configured limit.
	#[error("decode depth exceeded (max={max_depth})")]
	DepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Decoder restored more values than the configured budget.
	#[error("decode budget exceeded (max_values={max_values})")]
	BudgetExceeded {
		/// Configured value budget.
		max_values: usize,
	},
}

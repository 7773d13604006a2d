//! Typed object graphs to and from `NSKeyedArchiver` property lists.

/// Keyed-archive encoding, decoding, plist codec and diagnostics.
pub mod archive;

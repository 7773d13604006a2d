mod archiver;
/// Custom class registrations and built-in wrapper classification.
pub mod class;
/// Plist byte codec bridging the `plist` crate and [`ObjectGraph`].
pub mod codec;
mod decode;
mod describe;
mod encode;
mod epoch;
mod error;
mod field;
mod graph;
mod print;
mod record;
mod value;

/// Owned archiving context.
pub use archiver::Archiver;
/// Class descriptors, kinds, and custom registrations.
pub use class::{ClassDescriptor, ClassKind, ClassTable};
/// Serialized plist flavour.
pub use codec::{Container, Document, Format};
/// Graph decoder and its node model.
pub use decode::{DecodeOptions, Decoder, Node, Object};
/// Record field metadata and reflection traits.
pub use describe::{FieldDecl, FieldDescriptor, Fields, Record, TypeDescriptor, TypeRegistry, field_by_path, field_by_path_mut};
/// Graph encoder.
pub use encode::Encoder;
/// Reference epoch conversions.
pub use epoch::{REFERENCE_EPOCH_UNIX, from_reference_offset, to_reference_offset};
/// Error and result types.
pub use error::{ArchiveError, Result};
/// Archivable value trait and target shapes.
pub use field::{Field, Shape};
/// Flat object table.
pub use graph::ObjectGraph;
/// Diagnostic rendering.
pub use print::{PrintOptions, render, render_with};
/// Plist value model.
pub use value::{Dictionary, NULL_MARKER, Uid, Value};

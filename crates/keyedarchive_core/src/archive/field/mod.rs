use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::archive::epoch::{from_reference_offset, to_reference_offset};
use crate::archive::{ArchiveError, ClassKind, Decoder, Encoder, Fields, NULL_MARKER, Node, Result, Uid, Value};

/// Target shape named in mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
	/// `bool`.
	Bool,
	/// Fixed-width integer, by Rust type name.
	Integer(&'static str),
	/// `f32` or `f64`.
	Float,
	/// `String`.
	String,
	/// `Vec<u8>`.
	Bytes,
	/// Point in time.
	Timestamp,
	/// 16-byte identifier.
	Identifier,
	/// Ordered sequence.
	Sequence,
	/// String-keyed map.
	Map,
	/// Record type, by name.
	Record(&'static str),
	/// Opaque [`Value`].
	Any,
}

impl fmt::Display for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Shape::Bool => f.write_str("bool"),
			Shape::Integer(name) => f.write_str(name),
			Shape::Float => f.write_str("float"),
			Shape::String => f.write_str("string"),
			Shape::Bytes => f.write_str("bytes"),
			Shape::Timestamp => f.write_str("timestamp"),
			Shape::Identifier => f.write_str("identifier"),
			Shape::Sequence => f.write_str("sequence"),
			Shape::Map => f.write_str("map"),
			Shape::Record(name) => write!(f, "record {name}"),
			Shape::Any => f.write_str("any"),
		}
	}
}

/// A value the archiver can flatten into, and restore from, an object table.
pub trait Field {
	/// Target shape, for diagnostics and dispatch.
	fn shape(&self) -> Shape;

	/// Append this value (and its children) to the encoder's table, returning its index.
	fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid>;

	/// Overwrite this value from a decoded node.
	fn restore<'g>(&mut self, dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()>;

	/// Whether the value is absent (an unset optional).
	fn is_absent(&self) -> bool {
		false
	}

	/// Field access when this value is a record.
	fn as_record(&self) -> Option<&dyn Fields> {
		None
	}

	/// Mutable field access when this value is a record, allocating absent optionals.
	fn as_record_mut(&mut self) -> Option<&mut dyn Fields> {
		None
	}

	#[doc(hidden)]
	fn byte_slice(items: &[Self]) -> Option<&[u8]>
	where
		Self: Sized,
	{
		let _ = items;
		None
	}

	#[doc(hidden)]
	fn from_byte_slice(bytes: &[u8]) -> Option<Vec<Self>>
	where
		Self: Sized,
	{
		let _ = bytes;
		None
	}
}

impl Field for bool {
	fn shape(&self) -> Shape {
		Shape::Bool
	}

	fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
		Ok(enc.add_object(Value::Bool(*self)))
	}

	fn restore<'g>(&mut self, _dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
		match node {
			Node::Null => Ok(()),
			Node::Bool(value) => {
				*self = value;
				Ok(())
			}
			other => Err(other.mismatch(Shape::Bool)),
		}
	}
}

fn out_of_range(value: i128, target: Shape) -> ArchiveError {
	ArchiveError::IntegerOutOfRange { value, target }
}

macro_rules! integer_field {
	(@bytes u8) => {
		fn byte_slice(items: &[Self]) -> Option<&[u8]> {
			Some(items)
		}

		fn from_byte_slice(bytes: &[u8]) -> Option<Vec<Self>> {
			Some(bytes.to_vec())
		}
	};
	(@bytes $other:ident) => {};
	($($ty:ident => $variant:ident as $wide:ty),* $(,)?) => {$(
		impl Field for $ty {
			fn shape(&self) -> Shape {
				Shape::Integer(stringify!($ty))
			}

			fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
				Ok(enc.add_object(Value::$variant(*self as $wide)))
			}

			fn restore<'g>(&mut self, _dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
				let converted = match node {
					Node::Null => return Ok(()),
					Node::Int(value) => $ty::try_from(value).map_err(|_| out_of_range(i128::from(value), self.shape())),
					Node::UInt(value) => $ty::try_from(value).map_err(|_| out_of_range(i128::from(value), self.shape())),
					other => return Err(other.mismatch(self.shape())),
				};
				*self = converted?;
				Ok(())
			}

			integer_field!(@bytes $ty);
		}
	)*};
}

integer_field!(
	i8 => I64 as i64,
	i16 => I64 as i64,
	i32 => I64 as i64,
	i64 => I64 as i64,
	isize => I64 as i64,
	u8 => U64 as u64,
	u16 => U64 as u64,
	u32 => U64 as u64,
	u64 => U64 as u64,
	usize => U64 as u64,
);

macro_rules! float_field {
	($($ty:ident),*) => {$(
		impl Field for $ty {
			fn shape(&self) -> Shape {
				Shape::Float
			}

			fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
				Ok(enc.add_object(Value::F64(f64::from(*self))))
			}

			fn restore<'g>(&mut self, _dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
				match node {
					Node::Null => Ok(()),
					Node::Float(value) => {
						*self = value as $ty;
						Ok(())
					}
					other => Err(other.mismatch(Shape::Float)),
				}
			}
		}
	)*};
}

float_field!(f32, f64);

impl Field for String {
	fn shape(&self) -> Shape {
		Shape::String
	}

	fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
		Ok(enc.add_string(self))
	}

	fn restore<'g>(&mut self, _dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
		match node {
			Node::Null => {
				*self = NULL_MARKER.to_owned();
				Ok(())
			}
			Node::String(text) => {
				text.clone_into(self);
				Ok(())
			}
			other => Err(other.mismatch(Shape::String)),
		}
	}
}

fn restore_elements<'g, T: Field + Default>(dec: &mut Decoder<'g>, items: &'g [Value]) -> Result<Vec<T>> {
	let mut restored = Vec::with_capacity(items.len());
	for item in items {
		let mut element = T::default();
		dec.decode_value(item, &mut element)?;
		restored.push(element);
	}
	Ok(restored)
}

impl<T: Field + Default> Field for Vec<T> {
	fn shape(&self) -> Shape {
		match T::byte_slice(&[]) {
			Some(_) => Shape::Bytes,
			None => Shape::Sequence,
		}
	}

	fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
		if let Some(bytes) = T::byte_slice(self) {
			return Ok(enc.encode_bytes(bytes));
		}
		enc.encode_sequence(self.iter().map(|item| item as &dyn Field))
	}

	fn restore<'g>(&mut self, dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
		let shape = self.shape();
		match node {
			Node::Null => Ok(()),
			Node::Bytes(bytes) => {
				*self = T::from_byte_slice(bytes).ok_or_else(|| node.mismatch(shape))?;
				Ok(())
			}
			Node::Object(object) if object.kind == ClassKind::ByteBlob => {
				let bytes = dec.blob_payload(&object)?;
				*self = T::from_byte_slice(bytes).ok_or_else(|| node.mismatch(shape))?;
				Ok(())
			}
			Node::Array(items) => {
				*self = restore_elements(dec, items)?;
				Ok(())
			}
			Node::Object(object) if object.kind == ClassKind::OrderedCollection => {
				let items = dec.collection_items(&object)?;
				*self = restore_elements(dec, items)?;
				Ok(())
			}
			other => Err(other.mismatch(shape)),
		}
	}
}

impl<T: Field + Default> Field for Option<T> {
	fn shape(&self) -> Shape {
		match self {
			Some(inner) => inner.shape(),
			None => T::default().shape(),
		}
	}

	fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
		match self {
			Some(inner) => inner.flatten(enc),
			None => Err(ArchiveError::NonOmittableNil { field: enc.current_path() }),
		}
	}

	fn restore<'g>(&mut self, dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
		if let Node::Null = node {
			*self = None;
			return Ok(());
		}
		self.get_or_insert_with(T::default).restore(dec, node)
	}

	fn is_absent(&self) -> bool {
		self.as_ref().is_none_or(Field::is_absent)
	}

	fn as_record(&self) -> Option<&dyn Fields> {
		self.as_ref()?.as_record()
	}

	fn as_record_mut(&mut self) -> Option<&mut dyn Fields> {
		self.get_or_insert_with(T::default).as_record_mut()
	}
}

impl<T: Field> Field for Box<T> {
	fn shape(&self) -> Shape {
		(**self).shape()
	}

	fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
		(**self).flatten(enc)
	}

	fn restore<'g>(&mut self, dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
		(**self).restore(dec, node)
	}

	fn is_absent(&self) -> bool {
		(**self).is_absent()
	}

	fn as_record(&self) -> Option<&dyn Fields> {
		(**self).as_record()
	}

	fn as_record_mut(&mut self) -> Option<&mut dyn Fields> {
		(**self).as_record_mut()
	}
}

macro_rules! map_field {
	($($map:ident),*) => {$(
		impl<T: Field + Default> Field for $map<String, T> {
			fn shape(&self) -> Shape {
				Shape::Map
			}

			fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
				enc.encode_table(self.iter().map(|(key, value)| (key.as_str(), value as &dyn Field)))
			}

			fn restore<'g>(&mut self, dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
				let entries: Vec<(&'g str, &'g Value)> = match node {
					Node::Null => return Ok(()),
					Node::Object(object) if object.kind == ClassKind::KeyValueCollection => dec.table_entries(&object)?,
					Node::Dict(dict) => dict.iter().collect(),
					other => return Err(other.mismatch(Shape::Map)),
				};

				self.clear();
				for (key, value) in entries {
					let mut item = T::default();
					dec.decode_value(value, &mut item)?;
					self.insert(key.to_owned(), item);
				}
				Ok(())
			}
		}
	)*};
}

map_field!(BTreeMap, HashMap);

impl Field for DateTime<Utc> {
	fn shape(&self) -> Shape {
		Shape::Timestamp
	}

	fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
		Ok(enc.encode_timestamp(to_reference_offset(self)))
	}

	fn restore<'g>(&mut self, dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
		match node {
			Node::Null => Ok(()),
			Node::Object(object) if object.kind == ClassKind::Timestamp => {
				*self = from_reference_offset(dec.timestamp_offset(&object)?)?;
				Ok(())
			}
			Node::Date(offset) | Node::Float(offset) => {
				*self = from_reference_offset(offset)?;
				Ok(())
			}
			other => Err(other.mismatch(Shape::Timestamp)),
		}
	}
}

impl Field for Uuid {
	fn shape(&self) -> Shape {
		Shape::Identifier
	}

	fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
		Ok(enc.encode_identifier(self.as_bytes()))
	}

	fn restore<'g>(&mut self, dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
		match node {
			Node::Null => Ok(()),
			Node::Object(object) if object.kind == ClassKind::UniqueIdentifier => {
				let bytes = dec.identifier_bytes(&object)?;
				*self = Uuid::from_slice(bytes).map_err(|_| ArchiveError::InvalidIdentifier { len: bytes.len() })?;
				Ok(())
			}
			other => Err(other.mismatch(Shape::Identifier)),
		}
	}
}

impl Field for Value {
	fn shape(&self) -> Shape {
		Shape::Any
	}

	fn flatten(&self, enc: &mut Encoder<'_>) -> Result<Uid> {
		match self {
			Value::Null => Err(ArchiveError::UnsupportedKind { kind: "null" }),
			Value::Ref(_) => Err(ArchiveError::UnsupportedKind { kind: "reference" }),
			Value::Bool(_) | Value::I64(_) | Value::U64(_) | Value::F64(_) => Ok(enc.add_object(self.clone())),
			Value::Date(offset) => Ok(enc.encode_timestamp(*offset)),
			Value::String(text) => Ok(enc.add_string(text)),
			Value::Bytes(bytes) => Ok(enc.encode_bytes(bytes)),
			Value::Array(items) => enc.encode_sequence(items.iter().map(|item| item as &dyn Field)),
			Value::Dict(dict) => enc.encode_table(dict.iter().map(|(key, value)| (key, value as &dyn Field))),
		}
	}

	fn restore<'g>(&mut self, _dec: &mut Decoder<'g>, node: Node<'g>) -> Result<()> {
		*self = node.to_value();
		Ok(())
	}
}

#[cfg(test)]
mod tests;

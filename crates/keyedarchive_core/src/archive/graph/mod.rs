use crate::archive::{ArchiveError, Result, Uid, Value};

/// Flat, reference-indexed object table plus its root reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGraph {
	/// Objects in insertion order; position is the reference index.
	pub objects: Vec<Value>,
	/// Entry point of the graph.
	pub root: Uid,
}

impl ObjectGraph {
	/// Build a graph from an object table and root, checking every reference.
	pub fn new(objects: Vec<Value>, root: Uid) -> Result<Self> {
		let graph = Self { objects, root };
		graph.validate()?;
		Ok(graph)
	}

	/// Wrap a plain plist value as a one-object graph rooted at index 0.
	pub fn single(value: Value) -> Self {
		Self {
			objects: vec![value],
			root: Uid(0),
		}
	}

	/// Look up an object, failing on out-of-range indices.
	pub fn get(&self, uid: Uid) -> Result<&Value> {
		usize::try_from(uid.0)
			.ok()
			.and_then(|index| self.objects.get(index))
			.ok_or(ArchiveError::InvalidReference {
				index: uid.0,
				len: self.objects.len(),
			})
	}

	/// Root object.
	pub fn root_object(&self) -> Result<&Value> {
		self.get(self.root)
	}

	/// Number of objects in the table.
	pub fn len(&self) -> usize {
		self.objects.len()
	}

	/// Whether the table is empty.
	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}

	/// Check that the root and every nested reference point inside the table.
	pub fn validate(&self) -> Result<()> {
		self.get(self.root)?;

		let len = self.objects.len() as u64;
		let mut bad = None;
		for object in &self.objects {
			object.for_each_ref(&mut |uid| {
				if uid.0 >= len && bad.is_none() {
					bad = Some(uid);
				}
			});
			if let Some(uid) = bad {
				return Err(ArchiveError::InvalidReference {
					index: uid.0,
					len: self.objects.len(),
				});
			}
		}
		Ok(())
	}
}

/// Implement [`Record`](crate::archive::Record), [`Fields`](crate::archive::Fields) and
/// [`Field`](crate::archive::Field) for a struct by listing its fields in declaration order.
///
/// Each entry pairs a field with a [`FieldDecl`](crate::archive::FieldDecl):
///
/// ```
/// use keyedarchive::archive::FieldDecl;
/// use keyedarchive::impl_record;
///
/// #[derive(Debug, Default)]
/// struct Base {
/// 	id: i64,
/// }
///
/// #[derive(Debug, Default)]
/// struct Note {
/// 	base: Base,
/// 	title: String,
/// 	body: Option<String>,
/// 	scratch: String,
/// }
///
/// impl_record!(Base { id => FieldDecl::plain() });
/// impl_record!(Note {
/// 	base => FieldDecl::embed::<Base>(),
/// 	title => FieldDecl::tag("Title"),
/// 	body => FieldDecl::tag(",omitempty"),
/// 	scratch => FieldDecl::tag("-"),
/// });
/// ```
#[macro_export]
macro_rules! impl_record {
	($ty:ident { $($field:ident => $decl:expr),* $(,)? }) => {
		impl $crate::archive::Fields for $ty {
			#[allow(unused_assignments, unused_mut, unused_variables)]
			fn field_at(&self, index: usize) -> ::core::option::Option<&dyn $crate::archive::Field> {
				let mut position = 0usize;
				$(
					if position == index {
						return ::core::option::Option::Some(&self.$field);
					}
					position += 1;
				)*
				::core::option::Option::None
			}

			#[allow(unused_assignments, unused_mut, unused_variables)]
			fn field_at_mut(&mut self, index: usize) -> ::core::option::Option<&mut dyn $crate::archive::Field> {
				let mut position = 0usize;
				$(
					if position == index {
						return ::core::option::Option::Some(&mut self.$field);
					}
					position += 1;
				)*
				::core::option::Option::None
			}
		}

		impl $crate::archive::Record for $ty {
			fn declare() -> ::std::vec::Vec<$crate::archive::FieldDecl> {
				::std::vec![$( ($decl).ident(::core::stringify!($field)) ),*]
			}

			fn record_name() -> &'static str {
				::core::stringify!($ty)
			}
		}

		impl $crate::archive::Field for $ty {
			fn shape(&self) -> $crate::archive::Shape {
				$crate::archive::Shape::Record(<$ty as $crate::archive::Record>::record_name())
			}

			fn flatten(&self, enc: &mut $crate::archive::Encoder<'_>) -> $crate::archive::Result<$crate::archive::Uid> {
				enc.encode_record(self)
			}

			fn restore<'g>(&mut self, dec: &mut $crate::archive::Decoder<'g>, node: $crate::archive::Node<'g>) -> $crate::archive::Result<()> {
				dec.restore_record(self, node)
			}

			fn as_record(&self) -> ::core::option::Option<&dyn $crate::archive::Fields> {
				::core::option::Option::Some(self)
			}

			fn as_record_mut(&mut self) -> ::core::option::Option<&mut dyn $crate::archive::Fields> {
				::core::option::Option::Some(self)
			}
		}
	};
}

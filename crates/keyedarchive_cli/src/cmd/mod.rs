/// Format conversion command.
pub mod convert;
/// Container and class summary command.
pub mod info;
/// Object table listing command.
pub mod objects;
/// Graph tree rendering command.
pub mod render;

#[cfg(test)]
pub(crate) mod test_support;
mod util;

//! Ergonomic extensions over the generated protocol types.

mod common_ext;
mod distribution_ext;

pub use common_ext::document_id;

#[cfg(test)]
mod common_ext_test;
#[cfg(test)]
mod distribution_ext_test;

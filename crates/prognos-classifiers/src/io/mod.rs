//! Readers for uploaded CSV tables and the static taxonomy mapping.
pub mod table;
pub mod taxonomy;

pub use table::{read_table, Column, Table};
pub use taxonomy::TaxonomyMap;

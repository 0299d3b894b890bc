pub mod analyzer;
pub mod builder;
pub mod catalog;
pub mod error;
pub mod lexer;
pub mod select;

pub use analyzer::{Counts, SmilesAnalyzer, StructureAnalyzer, StructureError};
pub use builder::{OBJECTIVE_VARIABLE, SELECTION_CONSTRAINT, SelectionModel, Target, build_model, deviation_score};
pub use catalog::{Candidate, Catalog, CatalogEntry, load_catalog};
pub use error::{Error, ErrorKind, Result};
pub use select::{Selection, select_best, solve};

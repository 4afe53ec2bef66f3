pub mod aggregate;
pub mod analyzer;
pub mod chart;
pub mod coerce;
pub mod parser;
pub mod types;
pub mod utils;

pub use aggregate::group;
pub use analyzer::{classify, profile_columns};
pub use chart::build as build_chart;
pub use coerce::to_number;
pub use parser::parse;
pub use types::*;

pub mod clean;
pub mod extract;

pub use clean::{clean_row, CleanedRow};
pub use extract::{extract_complaints, RawComplaint};

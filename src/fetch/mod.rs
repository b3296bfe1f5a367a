pub mod datasets;
pub mod zips;

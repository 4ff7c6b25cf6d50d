pub mod domain;
pub mod infrastructure;
pub mod preprocess;
pub mod rescale;

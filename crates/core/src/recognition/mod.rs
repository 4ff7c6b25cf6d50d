pub mod domain;
pub mod engine;
pub mod features;
pub mod gallery;
pub mod infrastructure;

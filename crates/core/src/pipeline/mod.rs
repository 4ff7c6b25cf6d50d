pub mod annotate;
pub mod capture;
pub mod domain;
pub mod infrastructure;
pub mod state;
pub mod status;

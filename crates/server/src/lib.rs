pub mod errors;
pub mod forms;
pub mod routes;
pub mod startup;

pub use startup::{run, serve};

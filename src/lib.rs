pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod observer;
pub mod options;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod plan;
pub mod schemata;
pub mod state;
pub mod workspace;

pub use error::MutorError;
pub use orchestrator::Orchestrator;

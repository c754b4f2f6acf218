//! docintel-core
//!
//! Domain types, collaborator traits, configuration, text cleaning and the
//! chunker shared by every other docintel crate.

#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod clean;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::Chunker;
pub use error::{Error, Result};

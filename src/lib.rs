pub mod bootstrap;
pub mod config;
pub mod error;
pub mod install;
pub mod link;
pub mod package;
pub mod runtime;

pub use error::{BootstrapError, Result};

pub mod codegen;
pub mod config;
pub mod error;
pub mod glang;
pub mod items;
pub mod output;
pub mod source;

pub use error::{GenError, GenResult};

pub mod config;
pub mod error;
pub mod record;
pub mod source;

pub use config::Config;
pub use error::*;
pub use record::*;
pub use source::{InMemorySource, JsonFileSource, RecordSource};

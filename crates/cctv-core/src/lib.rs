pub mod config;
pub mod errors;
pub mod types;

pub use config::{DisplayConfig, DEFAULT_TITLE};
pub use errors::{CctvError, DecoderError};
pub use types::*;

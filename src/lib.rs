pub mod config;
pub mod error;
pub mod infra;
pub mod relay;
pub mod runtime;
pub mod shared;

pub use config::{Config, RelayMode};
pub use error::{ConfigError, RelayError, RelayErrorKind};
pub use relay::{InboundRequest, InboundResponse, Relay};

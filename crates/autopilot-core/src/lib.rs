pub mod clock;
pub mod config;
pub mod error;
pub mod label;
pub mod text;
pub mod types;

pub use config::{AutopilotConfig, ExecConfig, OracleConfig, RepairConfig, StoreBackend, StoreConfig};
pub use error::ParseError;
pub use label::ErrorLabel;
pub use types::*;

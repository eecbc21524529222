//! Configuration for onboarding runs.
//!
//! An optional `tether.toml` supplies defaults; command-line flags override it.
//! Looked up at an explicit path or `<config dir>/tether/tether.toml`.

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_tether_toml, parse_tether_toml_str, to_toml};
pub use schema::{AzSettings, RegistrationSettings, TemplateSettings, TetherConfig};
pub use store::{CONFIG_FILE_NAME, ConfigStore};

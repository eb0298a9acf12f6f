use thiserror::Error;

/// Error surface for parsing a config value from a string.
///
/// The teacher's `config` crate backs a full console-variable reflection
/// system (`try_set_from_str` over arbitrary nested structs); the URC only
/// needs a handful of scalar init-time options (backend choice, slot count,
/// vsync, msaa), so this keeps just the error taxonomy and drops the
/// generic `ConfigInterface` reflection trait as unneeded surface.
#[derive(Error, Debug)]
pub enum ConfigFromStrErr {
    #[error("failed to parse value: {0}")]
    ParsingErr(String),
    #[error("validation failed: {0}")]
    ValidationError(String),
}

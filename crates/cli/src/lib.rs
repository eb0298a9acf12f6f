//! Command-line argument parsing for the `demos/*` binaries (spec.md §6
//! "CLI surface: none in the core"). The URC itself never parses argv; this
//! crate exists purely so the demo entry points share one flag set instead
//! of each hand-rolling its own.

use clap::{Parser, ValueEnum};
use config::config::ConfigBackendKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Immediate,
    Deferred,
}

impl From<BackendArg> for ConfigBackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Immediate => ConfigBackendKind::Immediate,
            BackendArg::Deferred => ConfigBackendKind::Deferred,
        }
    }
}

/// Shared flags every `demos/*` binary accepts.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct DemoArgs {
    /// Which Unified Rendering Core backend to initialize.
    #[arg(long, value_enum, default_value = "deferred")]
    pub backend: BackendArg,

    /// Window width in physical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height in physical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Enables validation layers / debug-utils messenger and strict
    /// ordering-violation checks (spec.md §7 "ordering-violation is fatal in
    /// debug").
    #[arg(long)]
    pub debug: bool,

    /// Disables vsync (the deferred backend's swapchain present mode).
    #[arg(long)]
    pub no_vsync: bool,

    /// MSAA sample count; 1 disables multisampling.
    #[arg(long, default_value_t = 1)]
    pub msaa_samples: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults_with_no_arguments() {
        let args = DemoArgs::parse_from(["demo"]);
        assert_eq!(args.backend, BackendArg::Deferred);
        assert_eq!(args.width, 1280);
        assert_eq!(args.height, 720);
        assert!(!args.debug);
    }

    #[test]
    fn parses_immediate_backend_flag() {
        let args = DemoArgs::parse_from(["demo", "--backend", "immediate", "--debug"]);
        assert_eq!(args.backend, BackendArg::Immediate);
        assert!(args.debug);
    }
}

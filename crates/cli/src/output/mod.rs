//! Output handling for human-readable and JSON modes

mod formatter;

pub use formatter::Formatter;

/// Global output switches shared by all commands
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit strict JSON instead of styled text
    pub json: bool,
    /// Disable colors
    pub no_color: bool,
    /// Suppress everything but errors
    pub quiet: bool,
}

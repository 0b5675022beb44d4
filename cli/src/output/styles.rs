//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Healthy states (RUNNING, ONLINE)
    pub success: Style,
    /// Broken states (UNKNOWN, OFFLINE) and status messages
    pub error: Style,
    /// Transitional states (PROVISIONING)
    pub info: Style,
    /// Table header row
    pub header: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.header = Style::new().bold().cyan();
    }
}

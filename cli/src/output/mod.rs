//! Output formatting module

pub mod styles;
pub mod table;

use console::Term;
pub use styles::Styles;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
}

impl OutputContext {
    /// Create output context from the environment.
    ///
    /// Colors are enabled only when stdout is a terminal and `NO_COLOR` is
    /// unset; rendering switches to tab-delimited pipe mode off-terminal.
    #[must_use]
    pub fn detect() -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self { styles, is_tty }
    }

    /// Colorless pipe-mode context, independent of the environment.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            styles: Styles::default(),
            is_tty: false,
        }
    }
}

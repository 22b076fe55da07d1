//! REPL configuration.

use std::io::IsTerminal;
use std::path::PathBuf;

use jqrepl_kernel::SessionConfig;
use jqrepl_types::{Palette, PrintFlags};

/// Environment variable holding a jq-style colour spec.
pub const COLORS_ENV: &str = "JQ_COLORS";

/// How the REPL renders results and talks to the terminal.
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Flags used to dump output values.
    pub flags: PrintFlags,

    /// Colours used when `flags` contains `COLOUR`.
    pub palette: Palette,

    /// Where line history is persisted. `None` keeps history in memory.
    pub history_path: Option<PathBuf>,

    /// Cancel the running program on Ctrl-C.
    pub handle_ctrl_c: bool,

    /// Colour the prompt.
    pub prompt_colour: bool,

    /// Engine session settings.
    pub session: SessionConfig,
}

impl Default for ReplConfig {
    /// Pretty (one-space indent), uncoloured output with no history and no
    /// signal handling.
    fn default() -> Self {
        Self {
            flags: PrintFlags::PRETTY | PrintFlags::SPACE1,
            palette: Palette::default(),
            history_path: None,
            handle_ctrl_c: false,
            prompt_colour: false,
            session: SessionConfig::named("repl"),
        }
    }
}

impl ReplConfig {
    /// Configuration for a human at a terminal.
    ///
    /// Colours output when stdout is a terminal, honours `JQ_COLORS`, and
    /// keeps history in the XDG data directory.
    pub fn interactive() -> Self {
        let mut config = Self {
            history_path: history_path(),
            handle_ctrl_c: true,
            prompt_colour: true,
            ..Self::default()
        };

        if std::io::stdout().is_terminal() {
            config.flags |= PrintFlags::COLOUR;
        }

        if let Ok(spec) = std::env::var(COLORS_ENV) {
            match Palette::parse(&spec) {
                Ok(palette) => config.palette = palette,
                Err(e) => tracing::warn!("ignoring {}: {}", COLORS_ENV, e),
            }
        }

        config
    }

    pub fn with_flags(mut self, flags: PrintFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    /// Whether output (and errors) should carry ANSI colour.
    pub fn colour(&self) -> bool {
        self.flags.contains(PrintFlags::COLOUR)
    }
}

/// Default history file: `$XDG_DATA_HOME/jqrepl/history.txt`.
pub fn history_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.data_dir().join("jqrepl").join("history.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_plain() {
        let config = ReplConfig::default();
        assert_eq!(config.flags, PrintFlags::PRETTY | PrintFlags::SPACE1);
        assert!(!config.colour());
        assert!(!config.handle_ctrl_c);
        assert!(config.history_path.is_none());
    }

    #[test]
    fn builders_override() {
        let config = ReplConfig::default()
            .with_flags(PrintFlags::COLOUR)
            .with_history_path("/tmp/h.txt");
        assert!(config.colour());
        assert_eq!(config.history_path, Some(PathBuf::from("/tmp/h.txt")));
    }

    #[test]
    fn history_lives_under_jqrepl() {
        if let Some(path) = history_path() {
            assert!(path.ends_with("jqrepl/history.txt"));
        }
    }
}

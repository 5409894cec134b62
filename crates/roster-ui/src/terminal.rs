//! Terminal detection.

use std::env;

/// Returns `true` if stdout is connected to a terminal.
pub fn is_tty() -> bool {
    crossterm::tty::IsTty::is_tty(&std::io::stdout())
}

/// Terminal width in columns; 80 when stdout is not a terminal.
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| usize::from(cols))
        .unwrap_or(80)
}

/// The environment inputs of the color decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorEnv {
    pub no_color: bool,
    pub clicolor_off: bool,
    pub dumb_term: bool,
    pub force: bool,
    pub tty: bool,
}

impl ColorEnv {
    pub fn detect() -> Self {
        Self {
            no_color: env::var_os("NO_COLOR").is_some(),
            clicolor_off: env::var("CLICOLOR").as_deref() == Ok("0"),
            dumb_term: env::var("TERM").as_deref() == Ok("dumb"),
            force: env::var_os("CLICOLOR_FORCE").is_some(),
            tty: is_tty(),
        }
    }

    /// `NO_COLOR`, `CLICOLOR=0` and `TERM=dumb` win over `CLICOLOR_FORCE`,
    /// which wins over TTY detection.
    pub fn color(&self) -> bool {
        if self.no_color || self.clicolor_off || self.dumb_term {
            return false;
        }
        self.force || self.tty
    }
}

/// Whether ANSI colors should be written to stdout.
pub fn supports_color() -> bool {
    ColorEnv::detect().color()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_width_is_positive() {
        assert!(terminal_width() > 0);
    }

    #[test]
    fn color_decision() {
        let tty = ColorEnv {
            tty: true,
            ..ColorEnv::default()
        };
        assert!(tty.color());
        assert!(!ColorEnv::default().color());
        assert!(
            ColorEnv {
                force: true,
                ..ColorEnv::default()
            }
            .color()
        );
        assert!(
            !ColorEnv {
                no_color: true,
                force: true,
                tty: true,
                ..ColorEnv::default()
            }
            .color()
        );
        assert!(
            !ColorEnv {
                dumb_term: true,
                ..tty
            }
            .color()
        );
    }
}

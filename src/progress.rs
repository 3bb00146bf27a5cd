use std::io::{IsTerminal, stderr};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::config::Config;

const SPINNER_TEMPLATE: &str = "{prefix} {spinner} {elapsed_precise} | {msg}";

fn stderr_supports_progress() -> bool {
    stderr().is_terminal()
}

/// Spinner shown on stderr while a download runs. Hidden when quiet or when stderr is
/// not a terminal, so tests and pipes stay clean.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn start(config: &Config, prefix: &str, message: impl Into<String>) -> Self {
        if config.quiet > 0 || !stderr_supports_progress() {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr_with_hz(15));
        if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
            bar.set_style(style.tick_strings(&["-", "\\", "|", "/"]));
        }
        bar.set_prefix(prefix.to_string());
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

// Lightweight verbosity-gated logging helper used throughout the crate.
macro_rules! vprintln {
	($verbose:expr, $level:expr, $($arg:tt)*) => {
		if $verbose >= $level {
			eprintln!($($arg)*);
		}
	};
}

// Public library re-exports for integration tests and the binary.
pub mod archives;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod http;
pub mod picker;
pub mod progress;
pub mod types;

//! Pipeline steps.
//!
//! Each step is a free function over the build configuration and resolved
//! paths; the driver in [`crate::pipeline`] decides when they run.

pub mod compile;
pub mod harness;
pub mod lint;
pub mod markup;
pub mod output;

pub use compile::{bundle_scripts, compile_styles};
pub use harness::{generate_runner_page, run_tests};
pub use lint::lint;
pub use markup::{rewrite_entry_html, rewrite_markup};
pub use output::prepare_output;

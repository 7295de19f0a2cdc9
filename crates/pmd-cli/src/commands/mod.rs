//! CLI command implementations.

mod check;
mod inputs;
mod render;

pub use check::{CheckArgs, run_check};
pub use render::{RenderArgs, run_render};

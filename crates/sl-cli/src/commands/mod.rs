//! CLI subcommand implementations.

pub mod analyze;
pub mod periods;
pub mod pipeline;
pub mod report;
pub mod util;

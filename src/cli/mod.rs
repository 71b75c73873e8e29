pub mod commands;
pub mod output;

pub use commands::{CliArgs, Commands, OutputFormatArg, RealignArgs};
pub use output::{OutputFormat, OutputFormatter};

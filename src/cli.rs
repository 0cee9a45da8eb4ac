//! CLI domain: parse, route, output, and presentation only.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_binding_settings, format_describe_json, format_describe_text, format_list_json,
    format_list_text,
};
pub use route::RunContext;

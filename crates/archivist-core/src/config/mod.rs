//! Configuration loading shared by the archivist binaries.

mod loader;
mod path;
mod vars;

pub use loader::{Mergeable, load_from_paths};
pub use path::{CliArgs, ConfigPath, is_yaml_file};
pub use vars::{InterpolationResult, interpolate, interpolate_with};

//! Command implementations for hda-cli

pub mod edit;
pub mod history;
pub mod list;
pub mod publish;
pub mod status;

pub use edit::{run_configure, run_discard, run_edit};
pub use history::run_history;
pub use list::run_list;
pub use publish::run_publish;
pub use status::run_status;

use std::path::Path;

use hda_core::ManagerConfig;

use crate::error::{CliError, Result};

/// Load the manager configuration, erroring with a hint when no path was
/// given on the command line or through `HDAM_CONFIG`.
pub fn load_config(path: Option<&Path>) -> Result<ManagerConfig> {
    let Some(path) = path else {
        return Err(CliError::user(
            "no configuration file given, pass --config or set HDAM_CONFIG",
        ));
    };
    Ok(ManagerConfig::load(path)?)
}

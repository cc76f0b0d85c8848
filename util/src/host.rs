//! Host platform utility functions

use std::{env, path::PathBuf};

/// Environment variable holding the root directory of the software, which
/// contains the `params` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "ARM_SW_ROOT";

/// Get the path to the software root directory.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

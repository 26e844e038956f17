//! Path utilities for sentrytool files.
//!
//! ```text
//! $HOME
//!  └── .sentrytool.yaml
//! ```

use std::path::PathBuf;

use dirs::home_dir;
use lazy_static::lazy_static;

lazy_static! {
    static ref TOOL_CFG: PathBuf = PathBuf::from(".sentrytool.yaml");
}

/// Path for the default config file, if the home directory is known.
pub fn default_cfg_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(TOOL_CFG.as_path()))
}

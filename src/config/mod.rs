//! Layered configuration.
//!
//! Consolidates configuration from four tiers with field-by-field YAML merging:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/task-manager/config.yaml`
//! 3. **User** - `~/.task-manager/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `TASK_MANAGER_CONFIG_PATH` - Explicit config file (replaces the file tiers)
//! - `TASK_MANAGER_DB_PATH` - Database path
//! - `TASK_MANAGER_HOST` / `TASK_MANAGER_PORT` - Bind address
//! - `TASK_MANAGER_PROJECT_DIR` / `TASK_MANAGER_USER_DIR` - Tier directories

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, EnvOverrides};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;

//! Database location.

use crate::LEAGUE_MANAGER_DB_ENV_VAR;
use dirs::data_dir;
use std::path::PathBuf;


const APP_DIR: &str = "league-manager";
const DB_FILE: &str = "league.db";

/// Resolve the database path: `--db` flag, then `LEAGUE_MANAGER_DB`, then the user data directory.
pub fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    let from_env = std::env::var(LEAGUE_MANAGER_DB_ENV_VAR).ok();
    resolve_db_path_from(flag, from_env, data_dir())
}

/// Same as [`resolve_db_path`] with every source passed in.
pub fn resolve_db_path_from(
    flag: Option<PathBuf>,
    from_env: Option<String>,
    data_dir: Option<PathBuf>,
) -> PathBuf {
    flag.or_else(|| {
        from_env
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    })
    .or_else(|| data_dir.map(|d| d.join(APP_DIR).join(DB_FILE)))
    .unwrap_or_else(|| PathBuf::from(DB_FILE))
}

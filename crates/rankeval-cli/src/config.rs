//! Configuration and path resolution for the CLI.
//!
//! Finds the query source and relevance judgments across environments:
//! - Explicit: `--queries` / `--qrels` or `--data-dir`
//! - Custom: `$RANKEVAL_DATA_DIR`
//! - Working copy: `./evaluation`
//! - Installed: the platform data directory

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use rankeval_core::config::{QRELS_FILENAME, QUERIES_FILENAME};
use std::path::{Path, PathBuf};

/// Environment variable for a custom data directory
pub const DATA_DIR_ENV: &str = "RANKEVAL_DATA_DIR";

/// Data directory looked up relative to the working directory
const LOCAL_DATA_DIR: &str = "evaluation";

/// Resolved locations of the evaluation inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub queries: PathBuf,
    pub qrels: PathBuf,
}

/// Returns the data directory holding `query.txt` and `qrels.txt`.
///
/// Search order:
/// 1. `custom_dir` (the `--data-dir` flag)
/// 2. `$RANKEVAL_DATA_DIR` environment variable
/// 3. `./evaluation` if it exists
/// 4. Platform data directory:
///    - macOS: `~/Library/Application Support/dev.rankeval.Rankeval/`
///    - Linux: `~/.local/share/rankeval/`
///    - Windows: `%APPDATA%\rankeval\Rankeval\data\`
pub fn get_data_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let env_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    data_dir_from(custom_dir, env_dir, Path::new(LOCAL_DATA_DIR))
}

fn data_dir_from(
    custom_dir: Option<&PathBuf>,
    env_dir: Option<PathBuf>,
    local_dir: &Path,
) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.clone());
    }

    if let Some(dir) = env_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        return Ok(dir);
    }

    if local_dir.is_dir() {
        return Ok(local_dir.to_path_buf());
    }

    ProjectDirs::from("dev", "rankeval", "Rankeval")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

/// Resolves the query source and judgment paths.
///
/// Explicit file paths win; the data directory is only consulted for the
/// files not given explicitly.
pub fn resolve_inputs(
    data_dir: Option<&PathBuf>,
    queries: Option<&PathBuf>,
    qrels: Option<&PathBuf>,
) -> Result<InputPaths> {
    if let (Some(queries), Some(qrels)) = (queries, qrels) {
        return Ok(InputPaths {
            queries: queries.clone(),
            qrels: qrels.clone(),
        });
    }

    let dir = get_data_dir(data_dir)?;
    Ok(InputPaths {
        queries: queries
            .cloned()
            .unwrap_or_else(|| dir.join(QUERIES_FILENAME)),
        qrels: qrels.cloned().unwrap_or_else(|| dir.join(QRELS_FILENAME)),
    })
}

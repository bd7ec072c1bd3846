use std::path::{Path, PathBuf};

use crate::error::{RenderError, Result};

/// Regular files under `dir`, depth first in name order, at most `cap`.
/// Unfinished `.part` downloads are left out.
pub fn list_files(dir: &Path, cap: usize) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    walk(dir, cap, &mut out)?;
    Ok(out)
}

fn walk(dir: &Path, cap: usize, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(RenderError::io(dir))?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(RenderError::io(dir))?;
    entries.sort();

    for path in entries {
        if out.len() >= cap {
            break;
        }
        if path.is_dir() {
            walk(&path, cap, out)?;
        } else if path.is_file() && path.extension().map_or(true, |ext| ext != "part") {
            out.push(path);
        }
    }
    Ok(())
}

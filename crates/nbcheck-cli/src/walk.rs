//! Search-root discovery of notebook files.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Find every `.ipynb` file under `root`, in walk order.
///
/// Directories whose names start with `.` or `_` are skipped, as are files
/// starting with `.`.
pub fn find_notebooks(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_dir() {
            !name.starts_with('.') && !name.starts_with('_')
        } else {
            !name.starts_with('.')
        }
    });

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "ipynb")
        {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

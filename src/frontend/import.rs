use std::path::{Path, PathBuf};

use tracing::trace;

/// Where imports are looked up when no other directories are given
pub const DEFAULT_INCLUDE_PATH: &str = "/usr/include/lunar";

/// Extension of Lunar source files
pub const SOURCE_EXTENSION: &str = "lng";

/// Maps `import a::b::c;` paths to source files.
///
/// Every segment except the last names a directory and the last one names a
/// `<segment>.lng` file. The first segment is looked up in each search
/// directory in order and the first match is committed to, later segments
/// are only looked up inside the directory matched so far.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    search_paths: Vec<PathBuf>,
}

impl ImportResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn resolve(&self, segments: &[String]) -> Option<PathBuf> {
        let (file_name, directories) = segments.split_last()?;

        let Some((first, rest)) = directories.split_first() else {
            let file = self
                .search_paths
                .iter()
                .map(|search_path| source_file_in(search_path, file_name))
                .find(|path| path.is_file());

            trace!("import `{file_name}` resolved to {file:?}");

            return file;
        };

        let mut current = self
            .search_paths
            .iter()
            .map(|search_path| search_path.join(first))
            .find(|path| path.is_dir())?;

        for directory in rest {
            current.push(directory);

            if !current.is_dir() {
                trace!("import directory {} does not exist", current.display());
                return None;
            }
        }

        let file = source_file_in(&current, file_name);

        trace!("import `{file_name}` resolved to {}", file.display());

        file.is_file().then_some(file)
    }
}

fn source_file_in(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{name}.{SOURCE_EXTENSION}"))
}

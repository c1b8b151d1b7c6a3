use std::path::PathBuf;

/// Repository configuration. The storage root is the only externally
/// supplied setting the core depends on.
#[derive(Debug, Clone)]
pub struct Config {
    pub root_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root_dir: PathBuf::from("./data"),
        }
    }
}

impl Config {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Config {
            root_dir: root_dir.into(),
        }
    }
}

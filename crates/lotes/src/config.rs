use std::path::PathBuf;

/// Application configuration resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file (default: "dados.db")
    pub database: PathBuf,
    /// Directory holding local backups (default: "backups")
    pub backups_dir: PathBuf,
    /// Maximum accepted upload size in megabytes (default: 50)
    pub max_upload_mb: usize,
}

impl Config {
    pub fn new(database: impl Into<PathBuf>, backups_dir: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            backups_dir: backups_dir.into(),
            max_upload_mb: 50,
        }
    }

    pub fn with_max_upload_mb(mut self, max_upload_mb: usize) -> Self {
        self.max_upload_mb = max_upload_mb;
        self
    }

    /// Request body limit for uploads, in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_upload_limit() {
        let config = Config::new("dados.db", "backups");

        assert_eq!(config.database, PathBuf::from("dados.db"));
        assert_eq!(config.backups_dir, PathBuf::from("backups"));
        assert_eq!(config.max_upload_mb, 50);
    }

    #[test]
    fn test_max_upload_bytes_conversion() {
        let config = Config::new("dados.db", "backups").with_max_upload_mb(2);

        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
    }
}

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::domain::DashError;

/// Persists the one user preference: the theme identifier.
pub trait PreferenceStore {
    fn load_theme(&self) -> Option<String>;
    fn save_theme(&mut self, theme: &str) -> Result<(), DashError>;
}

/// Stores the theme identifier as the sole content of a file.
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    /// `path` may contain `~` and environment variables.
    pub fn new(path: &str) -> Self {
        let expanded = shellexpand::full(path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|e| {
                warn!("Could not expand {path}: {e}");
                path.to_string()
            });
        Self {
            path: PathBuf::from(expanded),
        }
    }
}

impl PreferenceStore for FilePreferences {
    fn load_theme(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let theme = content.trim().to_string();
                (!theme.is_empty()).then_some(theme)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {}: {e}", self.path.display());
                None
            }
        }
    }

    fn save_theme(&mut self, theme: &str) -> Result<(), DashError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, theme)?;
        debug!("Saved theme {theme} to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory store for model tests.
    #[derive(Default)]
    pub(crate) struct MemoryPreferences {
        pub(crate) theme: Option<String>,
    }

    impl PreferenceStore for MemoryPreferences {
        fn load_theme(&self) -> Option<String> {
            self.theme.clone()
        }

        fn save_theme(&mut self, theme: &str) -> Result<(), DashError> {
            self.theme = Some(theme.to_string());
            Ok(())
        }
    }

    #[test]
    fn missing_file_has_no_theme() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FilePreferences::new(dir.path().join("theme").to_str().unwrap());
        assert_eq!(prefs.load_theme(), None);
    }

    #[test]
    fn saved_theme_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config/theme");
        let mut prefs = FilePreferences::new(path.to_str().unwrap());
        prefs.save_theme("dark").unwrap();
        assert_eq!(prefs.load_theme().as_deref(), Some("dark"));

        let again = FilePreferences::new(path.to_str().unwrap());
        assert_eq!(again.load_theme().as_deref(), Some("dark"));
    }
}

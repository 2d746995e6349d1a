//! Theme preference and session identity.
//!
//! Both live in an [`AppContext`] that is passed to command handlers. They are
//! persisted through a [`KeyValueStore`] supplied by the caller: a JSON file
//! for the console, an in-memory map in tests.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

const THEME_KEY: &str = "theme";
const TOKEN_KEY: &str = "session.token";
const USER_KEY: &str = "session.user";

/// String key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Key-value store backed by a JSON object on disk.
///
/// Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse state file: {}", path.display()))?
        } else {
            debug!("No state file at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// In-memory store.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Color theme for terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// User preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
}

impl Preferences {
    /// Load from `store`; unknown or missing values fall back to defaults.
    pub fn load(store: &impl KeyValueStore) -> Self {
        let theme = store
            .get(THEME_KEY)
            .and_then(|v| Theme::parse(&v))
            .unwrap_or_default();
        Self { theme }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<()> {
        store.set(THEME_KEY, &self.theme.to_string())
    }
}

/// Who is signed in, if anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Bearer token issued by the backend.
    pub token: Option<String>,
    /// Display name of the signed-in user.
    pub user: Option<String>,
}

impl Session {
    pub fn load(store: &impl KeyValueStore) -> Self {
        Self {
            token: store.get(TOKEN_KEY),
            user: store.get(USER_KEY),
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<()> {
        match self.token.as_deref() {
            Some(token) => store.set(TOKEN_KEY, token)?,
            None => store.remove(TOKEN_KEY)?,
        }
        match self.user.as_deref() {
            Some(user) => store.set(USER_KEY, user),
            None => store.remove(USER_KEY),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Preferences and session, plus the store they persist to.
pub struct AppContext<S: KeyValueStore> {
    store: S,
    pub preferences: Preferences,
    pub session: Session,
}

impl<S: KeyValueStore> AppContext<S> {
    /// Load preferences and session from `store`.
    pub fn load(store: S) -> Self {
        let preferences = Preferences::load(&store);
        let session = Session::load(&store);
        Self {
            store,
            preferences,
            session,
        }
    }

    /// Switch between light and dark, returning the new theme.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        self.set_theme(self.preferences.theme.toggled())
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<Theme> {
        self.preferences.theme = theme;
        self.preferences.save(&mut self.store)?;
        Ok(theme)
    }

    /// Remember a freshly issued session.
    pub fn sign_in(&mut self, token: String, user: Option<String>) -> Result<()> {
        self.session = Session {
            token: Some(token),
            user,
        };
        self.session.save(&mut self.store)
    }

    /// Forget the current session.
    pub fn sign_out(&mut self) -> Result<()> {
        self.session = Session::default();
        self.session.save(&mut self.store)
    }

    #[cfg(test)]
    fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_store() {
        let ctx = AppContext::load(MemoryStore::default());
        assert_eq!(ctx.preferences.theme, Theme::Light);
        assert!(!ctx.session.is_authenticated());
    }

    #[test]
    fn test_toggle_theme_persists() {
        let mut ctx = AppContext::load(MemoryStore::default());
        assert_eq!(ctx.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(ctx.store().get(THEME_KEY).as_deref(), Some("dark"));

        assert_eq!(ctx.toggle_theme().unwrap(), Theme::Light);
        assert_eq!(Preferences::load(ctx.store()).theme, Theme::Light);
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let mut store = MemoryStore::default();
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(Preferences::load(&store).theme, Theme::Light);
    }

    #[test]
    fn test_sign_in_and_out() {
        let mut ctx = AppContext::load(MemoryStore::default());
        ctx.sign_in("tok".to_string(), Some("Dana".to_string()))
            .unwrap();
        assert!(ctx.session.is_authenticated());
        assert_eq!(ctx.store().get(TOKEN_KEY).as_deref(), Some("tok"));

        ctx.sign_out().unwrap();
        assert_eq!(ctx.session, Session::default());
        assert_eq!(ctx.store().get(TOKEN_KEY), None);
        assert_eq!(ctx.store().get(USER_KEY), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        {
            let mut ctx = AppContext::load(FileStore::open(&path).unwrap());
            ctx.set_theme(Theme::Dark).unwrap();
            ctx.sign_in("abc".to_string(), None).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        let ctx = AppContext::load(store);
        assert_eq!(ctx.preferences.theme, Theme::Dark);
        assert_eq!(ctx.session.token.as_deref(), Some("abc"));
        assert_eq!(ctx.session.user, None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse state file"));
    }
}

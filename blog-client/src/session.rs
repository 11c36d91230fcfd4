use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::BlogClientError;

/// File the CLI keeps the access token in between invocations.
pub const TOKEN_FILE: &str = ".blog_token";

/// The caller's credential. Every authenticated call receives it explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    access_token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(access_token: impl Into<String>) -> Self {
        let token = access_token.into();
        Self {
            access_token: Some(token).filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Reads a saved token. A missing file yields an anonymous session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BlogClientError> {
        match fs::read_to_string(path) {
            Ok(token) => Ok(Self::new(token.trim())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::anonymous()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BlogClientError> {
        let token = self.access_token().ok_or(BlogClientError::Unauthorized)?;
        fs::write(path, token)?;
        Ok(())
    }

    pub fn clear(path: impl AsRef<Path>) -> Result<(), BlogClientError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

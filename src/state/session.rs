use crate::utils::crypto;
use anyhow::{Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Backend session cookie, e.g. `session=eyJ0b2tlbl9pbmZvIjp...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub cookie: String,
    pub saved_at: DateTime<Utc>,
}

impl Session {
    /// Accepts either `name=value` or a bare value for the default `session` cookie.
    pub fn new(cookie: &str) -> Result<Self> {
        let cookie = cookie.trim().trim_start_matches("Cookie:").trim();
        if cookie.is_empty() {
            anyhow::bail!("Session cookie is empty");
        }
        let cookie = if cookie.contains('=') {
            cookie.to_string()
        } else {
            format!("session={}", cookie)
        };
        Ok(Self {
            cookie,
            saved_at: Utc::now(),
        })
    }
}

pub fn save(data_dir: &Path, session: &Session) -> Result<()> {
    let path = session_path(data_dir);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create credentials dir {:?}", parent))?;
    }

    let json = serde_json::to_string(session).context("Failed to serialize session")?;
    let sealed = crypto::encrypt(json.as_bytes(), data_dir).context("Failed to encrypt session")?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&sealed);

    fs::write(&path, encoded).with_context(|| format!("Failed to write session to {:?}", path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

pub fn load(data_dir: &Path) -> Result<Option<Session>> {
    let path = session_path(data_dir);

    if !path.exists() {
        return Ok(None);
    }

    let encoded = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read session from {:?}", path))?;

    let sealed = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .context("Failed to decode session")?;

    let json = crypto::decrypt(&sealed, data_dir).context("Failed to decrypt session")?;
    let json = String::from_utf8(json).context("Invalid UTF-8 in decrypted session")?;

    let session = serde_json::from_str(&json).context("Failed to parse session")?;
    Ok(Some(session))
}

pub fn delete(data_dir: &Path) -> Result<()> {
    let path = session_path(data_dir);

    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("Failed to delete session {:?}", path))?;
    }

    Ok(())
}

fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join("credentials").join("session")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let session = Session::new("session=abc.def").unwrap();

        save(temp.path(), &session).unwrap();
        let loaded = load(temp.path()).unwrap();

        assert_eq!(loaded, Some(session));
    }

    #[test]
    fn test_stored_file_is_not_plaintext() {
        let temp = TempDir::new().unwrap();
        save(temp.path(), &Session::new("session=plain-value").unwrap()).unwrap();

        let raw = fs::read_to_string(session_path(temp.path())).unwrap();
        assert!(!raw.contains("plain-value"));
    }

    #[test]
    fn test_load_nonexistent() {
        let temp = TempDir::new().unwrap();
        assert!(load(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        save(temp.path(), &Session::new("abc").unwrap()).unwrap();
        assert!(load(temp.path()).unwrap().is_some());

        delete(temp.path()).unwrap();
        assert!(load(temp.path()).unwrap().is_none());
        delete(temp.path()).unwrap();
    }

    #[test]
    fn test_cookie_normalization() {
        assert_eq!(Session::new("abc").unwrap().cookie, "session=abc");
        assert_eq!(
            Session::new("Cookie: session=xyz ").unwrap().cookie,
            "session=xyz"
        );
        assert!(Session::new("   ").is_err());
    }
}

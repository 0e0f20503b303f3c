use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{Context, Result};
use rand::RngCore;
use std::fs;
use std::path::Path;

const KEY_FILE: &str = "session.key";
const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;

fn load_or_create_key(data_dir: &Path) -> Result<Vec<u8>> {
    let key_path = data_dir.join(KEY_FILE);

    if key_path.exists() {
        let key = fs::read(&key_path)
            .with_context(|| format!("Failed to read session key {:?}", key_path))?;
        if key.len() != KEY_SIZE {
            anyhow::bail!("Session key {:?} has the wrong size", key_path);
        }
        return Ok(key);
    }

    let mut key = vec![0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);

    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {:?}", data_dir))?;
    fs::write(&key_path, &key).context("Failed to write session key")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&key_path, fs::Permissions::from_mode(0o600))?;
    }

    tracing::debug!(path = ?key_path, "created session key");
    Ok(key)
}

fn cipher(data_dir: &Path) -> Result<Aes256Gcm> {
    let key = load_or_create_key(data_dir)?;
    Aes256Gcm::new_from_slice(&key).map_err(|e| anyhow::anyhow!("Failed to create cipher: {}", e))
}

/// Encrypt with a fresh nonce; output is `nonce || ciphertext`.
pub fn encrypt(data: &[u8], data_dir: &Path) -> Result<Vec<u8>> {
    let cipher = cipher(data_dir)?;

    let mut sealed = vec![0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut sealed);
    let nonce = Nonce::from_slice(&sealed);

    let ciphertext = cipher
        .encrypt(nonce, data)
        .map_err(|e| anyhow::anyhow!("Encryption failed: {}", e))?;

    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

pub fn decrypt(sealed: &[u8], data_dir: &Path) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE {
        anyhow::bail!("Sealed data is shorter than its nonce");
    }

    let cipher = cipher(data_dir)?;
    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| anyhow::anyhow!("Decryption failed: {}", e))
}

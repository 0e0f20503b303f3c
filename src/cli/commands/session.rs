use anyhow::Result;

use crate::state::{session, Config, Session};

pub fn set(config: &Config, cookie: &str) -> Result<()> {
    let session = Session::new(cookie)?;
    session::save(&config.data_dir, &session)?;

    println!("Session saved to {:?}", config.credentials_dir());
    Ok(())
}

pub fn clear(config: &Config) -> Result<()> {
    session::delete(&config.data_dir)?;
    println!("Session removed.");
    Ok(())
}

pub fn show(config: &Config) -> Result<()> {
    match session::load(&config.data_dir)? {
        Some(session) => {
            let name = session.cookie.split('=').next().unwrap_or("session");
            println!("Session cookie '{}' stored", name);
            println!("  Saved at: {}", session.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Backend:  {}", config.backend_url);
            println!("  Config:   {:?}", config.config_path());
        }
        None => println!("No session stored. Run 'pconv login' first."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_show_clear() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_or_default(temp.path()).unwrap();

        set(&config, "abc123").unwrap();
        let stored = session::load(temp.path()).unwrap().unwrap();
        assert_eq!(stored.cookie, "session=abc123");
        show(&config).unwrap();

        clear(&config).unwrap();
        assert!(session::load(temp.path()).unwrap().is_none());
        show(&config).unwrap();
    }

    #[test]
    fn test_set_rejects_empty() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_or_default(temp.path()).unwrap();
        assert!(set(&config, "   ").is_err());
    }
}

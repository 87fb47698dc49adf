use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    pub fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        // Read .dragalarc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().flatten() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Set a key both in memory and in the rc file, creating the file (and its
    /// directory) on first use. Lines for other keys are kept as-is.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.inner.insert(key.to_string(), value.to_string());

        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        let mut lines: Vec<String> = Vec::new();
        let mut replaced = false;
        if self.config_path.exists() {
            for line in fs::read_to_string(&self.config_path)?.lines() {
                let is_key = line
                    .split_once('=')
                    .map(|(k, _)| k.trim() == key)
                    .unwrap_or(false);
                if is_key {
                    lines.push(format!("{}={}", key, value));
                    replaced = true;
                } else {
                    lines.push(line.to_string());
                }
            }
        }
        if !replaced {
            lines.push(format!("{}={}", key, value));
        }

        let mut file = fs::File::create(&self.config_path)
            .with_context(|| format!("failed to write {}", self.config_path.display()))?;
        for line in lines {
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "GOOGLE_API_KEY",
        "API_BASE_URL",
        "REQUEST_TIMEOUT",
        "DEFAULT_MODEL",
        "DEFAULT_COLOR",
        "PRETTIFY_MARKDOWN",
        "OS_NAME",
    ];

    KEYS.contains(&k) || k.starts_with("DRAGALA_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("dragala").join(".dragalarc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("API_BASE_URL".into(), "default".into());
    m.insert("DEFAULT_MODEL".into(), "gemini-pro".into());
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("DEFAULT_COLOR".into(), "magenta".into());
    m.insert("PRETTIFY_MARKDOWN".into(), "true".into());
    m.insert("OS_NAME".into(), "auto".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_rc_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(dir.path().join(".dragalarc"));
        assert_eq!(cfg.get("DEFAULT_MODEL").as_deref(), Some("gemini-pro"));
        assert!(cfg.get_bool("PRETTIFY_MARKDOWN"));
    }

    #[test]
    fn rc_lines_override_defaults_and_skip_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dragalarc");
        fs::write(&path, "# comment\nDEFAULT_MODEL = gemini-1.5-pro\n\nDEFAULT_COLOR=cyan\n").unwrap();
        let cfg = Config::load_from(path);
        assert_eq!(cfg.get("DEFAULT_MODEL").as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(cfg.get("DEFAULT_COLOR").as_deref(), Some("cyan"));
    }

    #[test]
    fn set_persists_and_rewrites_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join(".dragalarc");
        let mut cfg = Config::load_from(path.clone());

        cfg.set("DRAGALA_TEST_KEY", "first").unwrap();
        cfg.set("DRAGALA_TEST_KEY", "second").unwrap();
        assert_eq!(cfg.get("DRAGALA_TEST_KEY").as_deref(), Some("second"));

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("DRAGALA_TEST_KEY").count(), 1);
        assert!(text.contains("DRAGALA_TEST_KEY=second"));

        // Reload sees the persisted value
        let cfg2 = Config::load_from(path);
        assert_eq!(cfg2.get("DRAGALA_TEST_KEY").as_deref(), Some("second"));
    }
}

use std::{collections::HashMap, fs, path::Path};

#[derive(Debug)]
pub struct Settings {
    pub database_url: String,
    pub verifier_tick_ms: u64,
    pub verifier_step_percent: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/digipraman.db".into(),
            verifier_tick_ms: 60,
            verifier_step_percent: 2,
        }
    }
}

pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
            if let Some(v) = file_cfg.get("verifier_tick_ms") {
                if let Ok(parsed) = v.parse::<u64>() {
                    settings.verifier_tick_ms = parsed;
                }
            }
            if let Some(v) = file_cfg.get("verifier_step_percent") {
                if let Ok(parsed) = v.parse::<u8>() {
                    settings.verifier_step_percent = parsed;
                }
            }
        }
    }

    if let Ok(v) = std::env::var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Ok(v) = std::env::var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Ok(v) = std::env::var("APP__VERIFIER_TICK_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.verifier_tick_ms = parsed;
        }
    }

    if let Ok(v) = std::env::var("APP__VERIFIER_STEP_PERCENT") {
        if let Ok(parsed) = v.parse::<u8>() {
            settings.verifier_step_percent = parsed;
        }
    }

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plain_file_path_to_sqlite_url() {
        assert_eq!(
            prepare_database_url("./data/test.db"),
            "sqlite://./data/test.db"
        );
    }

    #[test]
    fn leaves_memory_and_full_urls_untouched() {
        assert_eq!(prepare_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            prepare_database_url("sqlite:///tmp/a.db"),
            "sqlite:///tmp/a.db"
        );
    }

    #[test]
    fn strips_bare_sqlite_prefix() {
        assert_eq!(
            prepare_database_url("sqlite:data\\test.db"),
            "sqlite://data/test.db"
        );
    }

    #[test]
    fn empty_url_falls_back_to_default() {
        assert_eq!(
            prepare_database_url("   "),
            Settings::default().database_url
        );
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let settings = load_settings(Path::new("/nonexistent/digipraman.toml"));
        assert_eq!(settings.database_url, "sqlite://./data/digipraman.db");
        assert_eq!(settings.verifier_tick_ms, 60);
        assert_eq!(settings.verifier_step_percent, 2);
    }
}

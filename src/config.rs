use std::collections::HashMap;

/// Settings rows and the environment variables that override them.
pub const SETTING_KEYS: &[(&str, &str, &str)] = &[
    ("tmdb_token", "ANIFLIX_TMDB_TOKEN", "TMDB API Read Token"),
    ("appwrite_endpoint", "ANIFLIX_APPWRITE_ENDPOINT", "Appwrite Endpoint"),
    ("appwrite_project", "ANIFLIX_APPWRITE_PROJECT", "Appwrite Project ID"),
    ("appwrite_database", "ANIFLIX_APPWRITE_DATABASE", "Appwrite Database ID"),
    ("appwrite_collection", "ANIFLIX_APPWRITE_COLLECTION", "Appwrite Collection ID"),
    ("appwrite_key", "ANIFLIX_APPWRITE_KEY", "Appwrite API Key (optional)"),
];

/// Token baked in at build time, used when neither env nor settings provide one.
const BUILD_TMDB_TOKEN: Option<&str> = option_env!("ANIFLIX_TMDB_TOKEN");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project: String,
    pub database: String,
    pub collection: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub tmdb_token: String,
    /// Remote trending backend; `None` keeps search counts in the local database.
    pub appwrite: Option<AppwriteConfig>,
}

impl AppConfig {
    pub fn from_settings(settings: &HashMap<String, String>) -> Self {
        Self::resolve(settings, |key| std::env::var(key).ok())
    }

    fn resolve(settings: &HashMap<String, String>, env: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| -> String {
            let env_key = SETTING_KEYS
                .iter()
                .find(|(k, _, _)| *k == key)
                .map(|(_, e, _)| *e)
                .unwrap_or_default();
            env(env_key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| settings.get(key).cloned())
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        let mut tmdb_token = value("tmdb_token");
        if tmdb_token.is_empty() {
            tmdb_token = BUILD_TMDB_TOKEN.unwrap_or_default().trim().to_string();
        }

        let endpoint = value("appwrite_endpoint");
        let project = value("appwrite_project");
        let database = value("appwrite_database");
        let collection = value("appwrite_collection");
        let api_key = Some(value("appwrite_key")).filter(|k| !k.is_empty());

        let appwrite = if [&endpoint, &project, &database, &collection]
            .iter()
            .all(|v| !v.is_empty())
        {
            Some(AppwriteConfig {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                project,
                database,
                collection,
                api_key,
            })
        } else {
            None
        };

        Self {
            tmdb_token,
            appwrite,
        }
    }

    pub fn trending_backend(&self) -> &'static str {
        if self.appwrite.is_some() {
            "appwrite"
        } else {
            "local"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn settings_without_appwrite_use_local_trending() {
        let s = settings(&[
            ("tmdb_token", " token "),
            ("appwrite_endpoint", "https://cloud.appwrite.io/v1"),
            ("appwrite_project", ""),
        ]);
        let config = AppConfig::resolve(&s, |_| None);
        assert_eq!(config.tmdb_token, "token");
        assert!(config.appwrite.is_none());
        assert_eq!(config.trending_backend(), "local");
    }

    #[test]
    fn complete_appwrite_settings_enable_remote_trending() {
        let s = settings(&[
            ("appwrite_endpoint", "https://cloud.appwrite.io/v1/"),
            ("appwrite_project", "proj"),
            ("appwrite_database", "db"),
            ("appwrite_collection", "metrics"),
            ("appwrite_key", ""),
        ]);
        let config = AppConfig::resolve(&s, |_| None);
        let appwrite = config.appwrite.unwrap();
        assert_eq!(appwrite.endpoint, "https://cloud.appwrite.io/v1");
        assert_eq!(appwrite.collection, "metrics");
        assert_eq!(appwrite.api_key, None);
    }

    #[test]
    fn environment_overrides_settings() {
        let s = settings(&[("tmdb_token", "from-db")]);
        let config = AppConfig::resolve(&s, |key| {
            (key == "ANIFLIX_TMDB_TOKEN").then(|| "from-env".to_string())
        });
        assert_eq!(config.tmdb_token, "from-env");

        let blank_env = AppConfig::resolve(&s, |_| Some("  ".to_string()));
        assert_eq!(blank_env.tmdb_token, "from-db");
    }
}

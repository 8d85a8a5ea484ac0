// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::path::Path;
use serde::{Serialize, Deserialize};
use figment::{Figment, Error, providers::{Format, Json, Yaml, Toml, Env, Serialized}};

use crate::constant::{ENV_PREFIX, DEFAULT_WIDGETS_GROUP, DEFAULT_WIDGETS_CATEGORIES};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[allow(unused)]
#[derive(Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub widgets: WidgetsConfig,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
}


#[derive(Debug, Deserialize, Serialize, Clone)]
#[allow(unused)]
pub struct ServerConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub tls: TLSConfig,
    /// Largest accepted request body, in bytes
    #[serde(default)]
    pub max_body_size: usize,
    #[serde(default)]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8081,
            tls: TLSConfig::default(),
            max_body_size: 100 * 1024,
            request_timeout_secs: 50,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

/// TLS is only enabled when both files are set.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[allow(unused)]
pub struct TLSConfig {
    #[serde(default)]
    pub cert_file: String,
    #[serde(default)]
    pub key_file: String,
}

impl TLSConfig {
    pub fn enabled(&self) -> bool {
        !self.cert_file.is_empty() && !self.key_file.is_empty()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[allow(unused)]
pub struct WidgetsConfig {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Default for WidgetsConfig {
    fn default() -> Self {
        WidgetsConfig {
            group: DEFAULT_WIDGETS_GROUP.to_string(),
            categories: DEFAULT_WIDGETS_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[allow(unused)]
pub struct KubernetesConfig {
    /// How long discovery results are reused, 0 keeps them for the process lifetime
    #[serde(default)]
    pub discovery_ttl_secs: u64,
    /// Attempts made by apply when the server reports a conflict
    #[serde(default)]
    pub apply_max_attempts: u32,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        KubernetesConfig {
            discovery_ttl_secs: 600,
            apply_max_attempts: 3,
        }
    }
}

pub struct AppConfigBuilder {
    figment: Figment,
}

impl AppConfigBuilder {
    pub fn with_file(&mut self, path: &str) -> &mut Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        self.figment = match extension {
            "json" => self.figment.clone().merge(Json::file(path)),
            "yaml" | "yml" => self.figment.clone().merge(Yaml::file(path)),
            "toml" => self.figment.clone().merge(Toml::file(path)),
            _ => self.figment.clone(),
        };
        self
    }

    pub fn with_env(&mut self) -> &mut Self {
        self.figment = self.figment.clone().merge(Env::prefixed(&format!("{}__", ENV_PREFIX)).split("__"));
        self
    }

    pub fn with_override_option<T: Serialize>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.figment = self.figment.clone().merge(Serialized::default(key, value));
        }
        self
    }

    pub fn build(&self) -> Result<AppConfig, Error> {
        self.figment.extract()
    }
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        AppConfigBuilder {
            figment: Figment::from(Serialized::defaults(AppConfig::default()))
        }
    }
}

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub image_host: ImageHostConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Where the document store keeps its file and how collections are named.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_store_file")]
    pub file: String,
    #[serde(default)]
    pub collections: CollectionNames,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), file: default_store_file(), collections: CollectionNames::default() }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CollectionNames {
    #[serde(default = "default_restaurants")]
    pub restaurants: String,
    #[serde(default = "default_scores")]
    pub scores: String,
    #[serde(default = "default_comments")]
    pub comments: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self { restaurants: default_restaurants(), scores: default_scores(), comments: default_comments() }
    }
}

/// Enumerations the restaurant validator checks payloads against.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogConfig {
    #[serde(default = "default_prices")]
    pub prices: Vec<String>,
    #[serde(default = "default_days")]
    pub days: Vec<String>,
    #[serde(default = "default_point_type")]
    pub point_type: String,
    /// Search radius used by location queries without `maxDistance`, in metres.
    #[serde(default = "default_max_distance")]
    pub default_max_distance: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            prices: default_prices(),
            days: default_days(),
            point_type: default_point_type(),
            default_max_distance: default_max_distance(),
        }
    }
}

impl CatalogConfig {
    pub fn is_known_price(&self, price: &str) -> bool {
        self.prices.iter().any(|p| p == price)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageHostConfig {
    #[serde(default = "default_image_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self { endpoint: default_image_endpoint(), client_id: String::new(), timeout_secs: default_image_timeout() }
    }
}

fn default_data_dir() -> String { "data".into() }
fn default_store_file() -> String { "documents.json".into() }
fn default_restaurants() -> String { "restaurants".into() }
fn default_scores() -> String { "scores".into() }
fn default_comments() -> String { "comments".into() }
fn default_prices() -> Vec<String> { ["$", "$$", "$$$", "$$$$"].iter().map(|s| s.to_string()).collect() }
fn default_days() -> Vec<String> {
    ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_point_type() -> String { "Point".into() }
fn default_max_distance() -> f64 { 10_000.0 }
fn default_image_endpoint() -> String { "https://api.imgur.com/3/image".into() }
fn default_image_timeout() -> u64 { 30 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like `load_and_validate`, but a missing config file yields validated defaults.
    pub fn load_or_default() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        self.catalog.validate()?;
        self.image_host.normalize_from_env();
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.file.trim().is_empty() {
            return Err(anyhow!("storage.file must not be empty"));
        }
        let c = &self.collections;
        if [&c.restaurants, &c.scores, &c.comments].iter().any(|n| n.trim().is_empty()) {
            return Err(anyhow!("storage.collections names must not be empty"));
        }
        Ok(())
    }

    pub fn file_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join(&self.file)
    }
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<()> {
        if self.prices.is_empty() || self.prices.iter().any(|p| p.is_empty()) {
            return Err(anyhow!("catalog.prices must list at least one non-empty tier"));
        }
        if self.days.is_empty() || self.days.iter().any(|d| d.is_empty()) {
            return Err(anyhow!("catalog.days must list at least one non-empty day"));
        }
        if self.point_type.trim().is_empty() {
            return Err(anyhow!("catalog.point_type must not be empty"));
        }
        if !(self.default_max_distance.is_finite() && self.default_max_distance > 0.0) {
            return Err(anyhow!("catalog.default_max_distance must be a positive number"));
        }
        Ok(())
    }
}

impl ImageHostConfig {
    pub fn normalize_from_env(&mut self) {
        // Client id is a secret; prefer the environment when the file leaves it out.
        if self.client_id.trim().is_empty() {
            if let Ok(id) = std::env::var("IMAGE_HOST_CLIENT_ID") {
                self.client_id = id;
            }
        }
    }
}

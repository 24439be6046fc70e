use std::path::PathBuf;

/// Runtime configuration, read from the process environment.
///
/// The Plant.id key and the Trefle token are optional here: a missing secret
/// only fails the request that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub database: String,
    pub collection: String,
    pub plant_id_key: Option<String>,
    pub plant_id_url: String,
    pub trefle_token: Option<String>,
    pub trefle_url: String,
    pub photo_dir: PathBuf,
    pub photo_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo_uri: "mongodb://localhost:27017/arbolitos".to_string(),
            database: "arbolitos".to_string(),
            collection: "plants".to_string(),
            plant_id_key: None,
            plant_id_url: "https://api.plant.id".to_string(),
            trefle_token: None,
            trefle_url: "https://trefle.io".to_string(),
            photo_dir: PathBuf::from("./photos"),
            photo_base_url: "http://localhost:8080/photos".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            mongo_uri: var("MONGO_URI").unwrap_or(defaults.mongo_uri),
            database: defaults.database,
            collection: defaults.collection,
            plant_id_key: var("PLANT_ID_KEY"),
            plant_id_url: var("PLANT_ID_URL").unwrap_or(defaults.plant_id_url),
            trefle_token: var("TREFLE_TOKEN"),
            trefle_url: var("TREFLE_URL").unwrap_or(defaults.trefle_url),
            photo_dir: var("PHOTO_DIR").map(PathBuf::from).unwrap_or(defaults.photo_dir),
            photo_base_url: var("PHOTO_BASE_URL").unwrap_or(defaults.photo_base_url),
        }
    }
}

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration, read from the environment (a `.env` file is loaded
/// by the binary before this runs).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path = std::env::var("MARKETLINK_DB").map_or_else(
            |_| {
                let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".into());
                PathBuf::from(home_dir)
                    .join(".marketlink")
                    .join("marketlink.db")
            },
            PathBuf::from,
        );

        let port = std::env::var("MARKETLINK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { db_path, port }
    }
}

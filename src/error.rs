#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Data directory not found")]
    NoDataDir,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Catalog error ({status}): {message}")]
    Catalog { status: u16, message: String },

    #[error("Not found in catalog: {0}")]
    NotFound(String),

    #[error("No catalog API token configured (set TMDB_API_TOKEN or catalog.api_token)")]
    MissingApiToken,

    #[error("Show {0} is not tracked in the library")]
    ShowNotTracked(u64),
}

impl Error {
    /// True only for the catalog's typed NotFound, never for transport failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

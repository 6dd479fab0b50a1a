use jobsift_core::FetchError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection-pool settings, read from the environment.
///
/// `DATABASE_URL` is required; `DATABASE_MAX_CONNECTIONS` defaults to 5 and
/// must be at least 1.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, FetchError> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| FetchError::Config("DATABASE_URL is not set".into()))?;

        let max_connections = parse_max_connections(
            std::env::var("DATABASE_MAX_CONNECTIONS").ok().as_deref(),
        )?;

        Ok(Self {
            url,
            max_connections,
        })
    }
}

fn parse_max_connections(raw: Option<&str>) -> Result<u32, FetchError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MAX_CONNECTIONS);
    };
    match raw.parse::<u32>() {
        Ok(0) => Err(FetchError::Config(
            "DATABASE_MAX_CONNECTIONS must be at least 1".into(),
        )),
        Ok(n) => Ok(n),
        Err(_) => Err(FetchError::Config(format!(
            "Invalid DATABASE_MAX_CONNECTIONS '{raw}': must be a positive integer"
        ))),
    }
}

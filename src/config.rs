use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Bootstrap accounts ensured at startup.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub admin_email: String,
    pub admin_password: String,
    pub admin_full_name: String,
    pub demo_email: String,
    pub demo_password: String,
    pub demo_full_name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub allowed_origins: Vec<String>,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
    pub bootstrap: BootstrapConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_algorithm(name: &str) -> anyhow::Result<Algorithm> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => anyhow::bail!("unsupported ALGORITHM: {other}"),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;

        let allowed_origins = env_or(
            "ALLOWED_HOSTS_STR",
            "http://localhost:3000,http://localhost:8000",
        )
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

        let jwt = JwtConfig {
            secret: env_or(
                "SECRET_KEY",
                "CHANGE_THIS_SECRET_KEY_IN_PRODUCTION_USE_openssl_rand_hex_32",
            ),
            ttl_minutes: std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
            algorithm: parse_algorithm(&env_or("ALGORITHM", "HS256"))?,
        };

        let ai = AiConfig {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: env_or("OPENAI_MODEL", "gpt-4"),
            max_tokens: std::env::var("OPENAI_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(1000),
            temperature: std::env::var("OPENAI_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.7),
        };

        let bootstrap = BootstrapConfig {
            admin_email: env_or("ADMIN_EMAIL", "admin@sprintsync.com"),
            admin_password: env_or("ADMIN_PASSWORD", "admin123"),
            admin_full_name: env_or("ADMIN_FULL_NAME", "Admin User"),
            demo_email: env_or("DEMO_EMAIL", "demo@sprintsync.com"),
            demo_password: env_or("DEMO_PASSWORD", "demo123"),
            demo_full_name: env_or("DEMO_FULL_NAME", "Demo User"),
        };

        Ok(Self {
            database_url,
            allowed_origins,
            jwt,
            ai,
            bootstrap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_algorithms() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("RS256").is_err());
    }
}

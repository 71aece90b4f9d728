use diesel::r2d2::{self, ConnectionManager};
use diesel::pg::PgConnection;
use std::env;
use log::warn;
use rand::{thread_rng, Rng};
use rand::distributions::Alphanumeric;

// Type aliases
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

// Config
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_expiry: i64,     // In hours
    pub refresh_expiry: i64, // In days
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(val) => val,
            Err(e) => {
                warn!("Failed to load JWT_SECRET: {}", e);
                warn!("Using default JWT secret - THIS IS NOT SECURE FOR PRODUCTION!");
                "change_me_cruise_jwt_secret".to_string()
            }
        };

        let jwt_expiry = env::var("JWT_EXPIRY_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(24);

        let refresh_expiry = env::var("REFRESH_EXPIRY_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(30);

        Self { jwt_secret, jwt_expiry, refresh_expiry }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret == "change_me_cruise_jwt_secret" {
            warn!("Using default JWT secret is not secure for production!");
        }

        if self.jwt_expiry <= 0 {
            return Err("JWT_EXPIRY_HOURS must be positive".to_string());
        }

        if self.refresh_expiry <= 0 {
            return Err("REFRESH_EXPIRY_DAYS must be positive".to_string());
        }

        Ok(())
    }

    pub fn generate_secure_secret() -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }
}

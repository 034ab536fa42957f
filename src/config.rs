// config.rs
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub whatsapp_token: String,
    pub phone_number_id: String,
    pub verify_token: String,
    pub group_id: String,
    pub admin_id: String,
    pub livescore_api_key: String,
    pub port: u16,
    pub host: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let group_id = env::var("GROUP_ID").unwrap_or_else(|_| "default_group".to_string());

        AppConfig {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            whatsapp_token: env::var("WHATSAPP_TOKEN")
                .unwrap_or_else(|_| "dummy_token".to_string()),
            phone_number_id: env::var("PHONE_NUMBER_ID")
                .unwrap_or_else(|_| "dummy_id".to_string()),
            verify_token: env::var("VERIFY_TOKEN")
                .unwrap_or_else(|_| "takhmin_secret".to_string()),
            admin_id: env::var("ADMIN_ID").unwrap_or_else(|_| group_id.clone()),
            group_id,
            livescore_api_key: env::var("LIVESCORE_API_KEY").unwrap_or_else(|_| {
                tracing::warn!("LIVESCORE_API_KEY not set, fixture fetches will fail");
                String::new()
            }),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        AppConfig {
            database_url: "mongodb://localhost:27017".to_string(),
            whatsapp_token: "dummy_token".to_string(),
            phone_number_id: "dummy_id".to_string(),
            verify_token: "takhmin_secret".to_string(),
            group_id: "group-1".to_string(),
            admin_id: "admin-1".to_string(),
            livescore_api_key: String::new(),
            port: 3000,
            host: "127.0.0.1".to_string(),
        }
    }
}

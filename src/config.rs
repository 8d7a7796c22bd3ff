#[derive(Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub auth: AuthConfig,
}

#[derive(Clone)]
pub struct AuthConfig {
    /// Base64-encoded HS256 signing key.
    pub key: String,
    pub token_ttl: time::Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Diarly".to_string(),
            auth: AuthConfig {
                key: "dGVzdC1hdXRoLWtleS10ZXN0LWF1dGgta2V5".to_string(),
                token_ttl: time::Duration::hours(12),
                cookie_name: "session".to_string(),
                cookie_secure: false,
            },
        }
    }
}

use crate::configuration::get_configuration;
use crate::middleware::authentication::jwt::{encode_jwt, JwtClaims};

/// Signs a bearer token with the configured secret, for calling admin routes locally.
pub struct TokenCommand {
    sub: String,
    role: String,
    email: String,
    ttl: i64,
}

impl TokenCommand {
    pub fn new(sub: String, role: String, email: String, ttl: i64) -> Self {
        Self {
            sub,
            role,
            email,
            ttl,
        }
    }
}

impl crate::console::commands::CallableTrait for TokenCommand {
    fn call(&self) -> Result<(), Box<dyn std::error::Error>> {
        let settings = get_configuration()?;
        let claims = JwtClaims {
            sub: self.sub.clone(),
            role: self.role.clone(),
            email: self.email.clone(),
            exp: chrono::Utc::now().timestamp() + self.ttl,
        };

        println!("{}", encode_jwt(&claims, settings.auth.jwt_secret.as_bytes())?);
        Ok(())
    }
}

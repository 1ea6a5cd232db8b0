use serde::Deserialize;

/// Identity handed over by the session provider through a bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub role: String,
    pub email: String,
}

impl User {
    pub fn has_role(&self, roles: &[String]) -> bool {
        roles.iter().any(|role| role == &self.role)
    }
}

use serde::{Deserialize, Serialize};

use super::Entity;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
}

impl User {
    /// A user with a freshly generated client-side id.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
        }
    }
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.id
    }
}

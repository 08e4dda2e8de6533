use serde::Serialize;

use crate::models::User;

/// Wire shape for a user. Built from [`User`] so the password hash can
/// never leak into a response.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub instrument: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            instrument: user.instrument.clone(),
        }
    }
}

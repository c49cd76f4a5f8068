use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::db::types::UserRole;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) email: Option<String>,
    pub(crate) password: String,
    #[serde(default = "default_user_role")]
    pub(crate) role: UserRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: Option<String>,
    pub(crate) role: UserRole,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self { id: user.id, username: user.username, email: user.email, role: user.role }
    }
}

/// User shape embedded in the login response; carries the staff/superuser
/// flags so admin frontends can gate their UI.
#[derive(Debug, Serialize)]
pub(crate) struct LoginUserResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: Option<String>,
    pub(crate) role: UserRole,
    pub(crate) is_staff: bool,
    pub(crate) is_superuser: bool,
}

impl LoginUserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

fn default_user_role() -> UserRole {
    UserRole::Student
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_defaults_to_student() {
        let parsed: RegisterRequest =
            serde_json::from_str(r#"{"username":"alice","password":"secret123"}"#).unwrap();
        assert_eq!(parsed.role, UserRole::Student);
        assert!(parsed.email.is_none());
    }

    #[test]
    fn register_request_accepts_admin_role() {
        let parsed: RegisterRequest = serde_json::from_str(
            r#"{"username":"root","password":"secret123","role":"admin","email":"a@b.c"}"#,
        )
        .unwrap();
        assert_eq!(parsed.role, UserRole::Admin);
        assert_eq!(parsed.email.as_deref(), Some("a@b.c"));
    }
}

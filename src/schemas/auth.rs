use serde::{Deserialize, Serialize};

use crate::schemas::user::LoginUserResponse;

#[derive(Debug, Serialize)]
pub(crate) struct TokenPairResponse {
    pub(crate) access: String,
    pub(crate) refresh: String,
    pub(crate) user: LoginUserResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshRequest {
    pub(crate) refresh: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    pub(crate) token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccessTokenResponse {
    pub(crate) access: String,
}

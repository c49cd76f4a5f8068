use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Category;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CategoryPayload {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CategoryResponse {
    pub(crate) id: String,
    pub(crate) name: String,
}

impl CategoryResponse {
    pub(crate) fn from_db(category: Category) -> Self {
        Self { id: category.id, name: category.name }
    }
}

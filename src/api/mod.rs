pub(crate) mod auth;
pub(crate) mod categories;
pub(crate) mod errors;
pub(crate) mod exams;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod questions;
pub(crate) mod reports;
pub(crate) mod router;

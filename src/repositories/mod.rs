pub(crate) mod attempts;
pub(crate) mod categories;
pub(crate) mod exams;
pub(crate) mod questions;
pub(crate) mod stats;
pub(crate) mod users;

use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::question_gen::TextGenerator;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, generator: Arc<dyn TextGenerator>) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, generator }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn generator(&self) -> &dyn TextGenerator {
        self.inner.generator.as_ref()
    }
}

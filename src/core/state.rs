use std::sync::Arc;

use crate::core::config::Settings;
use crate::repositories::classifications::SharedClassificationStore;
use crate::services::dashboard::DashboardService;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    classifications: SharedClassificationStore,
    dashboard: DashboardService,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        classifications: SharedClassificationStore,
        dashboard: DashboardService,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, classifications, dashboard }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn classifications(&self) -> &SharedClassificationStore {
        &self.inner.classifications
    }

    pub(crate) fn dashboard(&self) -> &DashboardService {
        &self.inner.dashboard
    }
}

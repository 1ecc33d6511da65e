use std::sync::Arc;

use crate::core::config::Settings;
use crate::flows::grading::GradingFlow;
use crate::flows::upload::UploadFlow;
use crate::services::ai_feedback::AiFeedbackService;
use crate::services::gateway::{HttpGateway, SharedGateway};
use crate::services::notifier::{LogNotifier, Notifier};
use crate::store::SubmissionStore;

/// Shared services every flow runs against. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    store: SubmissionStore,
    upload: UploadFlow,
    grading: GradingFlow,
    ai: AiFeedbackService,
    notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let gateway: SharedGateway = Arc::new(HttpGateway::from_settings(&settings)?);
        Self::with_parts(settings, gateway, Arc::new(LogNotifier))
    }

    pub fn with_parts(
        settings: Settings,
        gateway: SharedGateway,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let store = SubmissionStore::new(gateway.clone());
        let upload = UploadFlow::new(
            gateway.clone(),
            store.clone(),
            notifier.clone(),
            settings.upload().max_upload_bytes(),
        );
        let grading = GradingFlow::new(gateway.clone(), store.clone());
        let ai = AiFeedbackService::from_settings(&settings)?;

        Ok(Self {
            inner: Arc::new(InnerState { settings, store, upload, grading, ai, notifier }),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn store(&self) -> &SubmissionStore {
        &self.inner.store
    }

    pub fn upload(&self) -> &UploadFlow {
        &self.inner.upload
    }

    pub fn grading(&self) -> &GradingFlow {
        &self.inner.grading
    }

    pub fn ai(&self) -> &AiFeedbackService {
        &self.inner.ai
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }
}

use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::OrgDirectoryApi,
    error::OrgDirectoryError,
    model::{ImportReport, ProgressCallback, TemplateKind},
};
use crate::domain::error::ImportError;
use crate::domain::import::ImportService;

/// Local implementation of the module API that delegates to the domain
/// service.
pub struct OrgDirectoryLocalClient {
    service: Arc<ImportService>,
}

impl OrgDirectoryLocalClient {
    pub fn new(service: Arc<ImportService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl OrgDirectoryApi for OrgDirectoryLocalClient {
    async fn import_users(
        &self,
        bytes: &[u8],
        extension: &str,
        on_progress: ProgressCallback<'_>,
    ) -> anyhow::Result<ImportReport> {
        self.service
            .import_users_file(bytes, extension, on_progress)
            .await
            .map_err(map_import_error_to_anyhow)
    }

    async fn import_assignments(
        &self,
        bytes: &[u8],
        extension: &str,
        on_progress: ProgressCallback<'_>,
    ) -> anyhow::Result<ImportReport> {
        self.service
            .import_assignments_file(bytes, extension, on_progress)
            .await
            .map_err(map_import_error_to_anyhow)
    }

    async fn render_template(&self, kind: TemplateKind) -> anyhow::Result<String> {
        let rendered = match kind {
            TemplateKind::Users => self.service.user_template(),
            TemplateKind::Assignments => self.service.assignment_template(),
        };
        rendered.map_err(map_import_error_to_anyhow)
    }

    async fn recompute_supervisor_roles(&self) -> anyhow::Result<u32> {
        self.service
            .recompute_supervisor_roles()
            .await
            .map_err(map_import_error_to_anyhow)
    }
}

/// Map domain errors to contract errors wrapped in anyhow.
fn map_import_error_to_anyhow(error: ImportError) -> anyhow::Error {
    let contract_error = match error {
        ImportError::File(e) => OrgDirectoryError::validation(e.to_string()),
        ImportError::Precondition { message } => OrgDirectoryError::precondition(message),
        ImportError::Store { .. } => OrgDirectoryError::internal(),
    };
    anyhow::Error::new(contract_error)
}

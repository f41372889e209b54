use async_trait::async_trait;

use crate::contract::model::{ImportReport, ProgressCallback, TemplateKind};

/// Public API of the organizational directory module.
///
/// Other modules (and the CLI) consume the import pipeline through this
/// trait; errors cross the boundary as [`crate::contract::OrgDirectoryError`]
/// wrapped in `anyhow::Error`.
#[async_trait]
pub trait OrgDirectoryApi: Send + Sync {
    /// Import a user file (xlsx/xls/csv bytes plus declared extension).
    async fn import_users(
        &self,
        bytes: &[u8],
        extension: &str,
        on_progress: ProgressCallback<'_>,
    ) -> anyhow::Result<ImportReport>;

    /// Import a supervisor-collaborator assignment file.
    async fn import_assignments(
        &self,
        bytes: &[u8],
        extension: &str,
        on_progress: ProgressCallback<'_>,
    ) -> anyhow::Result<ImportReport>;

    /// Render a delimited-text template with canonical headers and sample rows.
    async fn render_template(&self, kind: TemplateKind) -> anyhow::Result<String>;

    /// Recompute the supervisor role for every distinct supervisor across all
    /// active assignments. Returns the number of promotions applied.
    async fn recompute_supervisor_roles(&self) -> anyhow::Result<u32>;
}

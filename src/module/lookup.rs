use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::{info, instrument};

use crate::config::RegistryConfig;
use crate::module::types::{ModuleDownload, ModuleVersionList};
use crate::provider::lookup::with_deadline;
use crate::release::error::RegistryError;
use crate::release::filter::{collect_releases_since, find_release};
use crate::release::source::ReleaseSource;

/// Repository that hosts releases for module `name` targeting `system`
pub fn module_repo_name(system: &str, name: &str) -> String {
    format!("terraform-{system}-{name}")
}

pub struct ModuleLookup {
    source: Arc<dyn ReleaseSource>,
    request_timeout: Duration,
}

impl ModuleLookup {
    pub fn new(source: Arc<dyn ReleaseSource>, config: &RegistryConfig) -> Self {
        Self {
            source,
            request_timeout: config.request_timeout(),
        }
    }

    /// Lists the installable versions of a module, newest first.
    ///
    /// Returns `Ok(None)` when the module repository does not exist.
    #[instrument(skip(self))]
    pub async fn list_module_versions(
        &self,
        namespace: &str,
        name: &str,
        system: &str,
    ) -> Result<Option<ModuleVersionList>, RegistryError> {
        with_deadline(
            self.request_timeout,
            self.list_module_versions_inner(namespace, name, system),
        )
        .await
    }

    async fn list_module_versions_inner(
        &self,
        namespace: &str,
        name: &str,
        system: &str,
    ) -> Result<Option<ModuleVersionList>, RegistryError> {
        let repo = module_repo_name(system, name);

        if !self.source.repository_exists(namespace, &repo).await? {
            info!(namespace, repo = %repo, "Module repository not found");
            return Ok(None);
        }

        let releases =
            collect_releases_since(&*self.source, namespace, &repo, None, TimeDelta::zero())
                .await?;
        let versions = releases.iter().filter_map(|release| release.version()).collect();

        Ok(Some(ModuleVersionList::new(versions)))
    }

    /// Resolves the source archive location of one module version.
    ///
    /// Returns `Ok(None)` when the repository or the version does not exist.
    #[instrument(skip(self))]
    pub async fn module_download(
        &self,
        namespace: &str,
        name: &str,
        system: &str,
        version: &str,
    ) -> Result<Option<ModuleDownload>, RegistryError> {
        with_deadline(
            self.request_timeout,
            self.module_download_inner(namespace, name, system, version),
        )
        .await
    }

    async fn module_download_inner(
        &self,
        namespace: &str,
        name: &str,
        system: &str,
        version: &str,
    ) -> Result<Option<ModuleDownload>, RegistryError> {
        let repo = module_repo_name(system, name);

        if !self.source.repository_exists(namespace, &repo).await? {
            info!(namespace, repo = %repo, "Module repository not found");
            return Ok(None);
        }

        let release = find_release(&*self.source, namespace, &repo, version).await?;

        Ok(release.map(|release| ModuleDownload {
            location: release.tarball_url,
        }))
    }
}

//! Wiring shared by the commands that talk to the API.

use std::sync::Arc;

use anyhow::{Context, Result};
use shopdash_core::config::{Config, paths};
use shopdash_core::gateway::GatewayClient;
use shopdash_core::session::SessionStore;
use shopdash_core::shell::{Route, Shell};
use shopdash_core::storage::FileStorage;

pub struct AppContext {
    pub config: Config,
    pub shell: Shell,
}

impl AppContext {
    /// Restores the persisted session and builds the gateway and shell.
    pub fn new(config: Config) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(paths::session_path()));
        let session = SessionStore::new(storage);
        session.restore();

        let api_url = config.effective_api_url()?;
        let gateway = GatewayClient::new(&api_url, session, config.request_timeout())
            .context("create API client")?;
        tracing::debug!(api_url = %gateway.base_url(), "api client ready");

        Ok(Self {
            config,
            shell: Shell::new(Arc::new(gateway)),
        })
    }

    pub fn gateway(&self) -> Arc<GatewayClient> {
        Arc::clone(self.shell.gateway())
    }

    /// Navigates to a page route, failing when the guard sends us to login.
    pub fn open(&mut self, route: Route) -> Result<()> {
        if self.shell.go(route) != route {
            anyhow::bail!("Not logged in. Run `shopdash login` first.");
        }
        Ok(())
    }

    /// Fails if a request rejected the credential while loading.
    pub fn check_session(&mut self) -> Result<()> {
        if self.shell.process_events() {
            anyhow::bail!("Session expired, please log in again with `shopdash login`.");
        }
        Ok(())
    }
}

//! Command implementations

// plan / apply / destroy / status
pub mod declarative;

// show / import / forget
pub mod users;

use anyhow::{Context as _, Result};
use ::declarative::{BoxedResource, StateFile};
use memberkit::backend::nexus::NexusStore;
use std::path::PathBuf;
use std::sync::Arc;

use crate::Context;
use crate::config::RolesyncConfig;
use crate::paths;
use crate::resource::{self, Factory, StoreHandle};

/// Everything a command needs: config, remote store and recorded state
pub struct Session {
    pub config: RolesyncConfig,
    pub store: StoreHandle,
    pub state: StateFile,
    pub state_path: PathBuf,
}

impl Session {
    /// Load config and state and connect the store described by the config
    pub fn open(ctx: &Context) -> Result<Self> {
        let config_path = paths::config_file(ctx.config.as_deref())?;
        let config = RolesyncConfig::load(&config_path)?;
        let store = connect(&config)?;
        Self::with_store(ctx, config, store)
    }

    /// Open a session over an existing store
    pub fn with_store(ctx: &Context, config: RolesyncConfig, store: StoreHandle) -> Result<Self> {
        let state_path = paths::state_file(ctx.state.as_deref())?;
        let state = StateFile::load(&state_path)?;
        Ok(Self {
            config,
            store,
            state,
            state_path,
        })
    }

    /// Resources declared in the config
    pub fn declared(&self) -> Vec<BoxedResource> {
        resource::declared(&self.config, &self.store)
    }

    /// Factory for recorded resources
    pub fn factory(&self) -> Factory {
        Factory::new(self.store.clone())
    }

    /// Persist the state file
    pub fn save_state(&mut self) -> Result<()> {
        self.state
            .save(&self.state_path)
            .with_context(|| format!("Failed to save state to {}", self.state_path.display()))
    }
}

/// Build the Nexus store from the `[server]` section
fn connect(config: &RolesyncConfig) -> Result<StoreHandle> {
    let server = &config.server;
    let mut store = NexusStore::new(server.url.as_str()).with_timeout(server.timeout());
    if let Some((username, password)) = server.credentials()? {
        store = store.with_credentials(&username, &password);
    }
    log::debug!("Using Nexus at {}", store.base_url());
    Ok(Arc::new(store))
}

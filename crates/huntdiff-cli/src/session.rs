//! Per-invocation plumbing: resolved config, the state store, and the hunt source.

use anyhow::Result;
use huntdiff_core::config::{CliOverrides, EffectiveConfig, resolve_config};
use huntdiff_core::store::{DEFAULT_LOCK_TIMEOUT, JsonFileStore, StateStore};
use huntdiff_core::upstream::{HttpHuntSource, HuntSource, SnapshotSource};
use huntdiff_core::{AggregateState, EngineError, ErrorCode};
use std::path::Path;
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error};

pub struct Session {
    pub config: EffectiveConfig,
    pub output: OutputMode,
    store: JsonFileStore,
}

impl Session {
    /// Resolve configuration for `project_root` and open the state store.
    ///
    /// # Errors
    ///
    /// Returns an error (already rendered to stderr) if a config file cannot
    /// be parsed or an output format is unknown.
    pub fn open(project_root: &Path, overrides: &CliOverrides) -> Result<Self> {
        let config = match resolve_config(project_root, overrides) {
            Ok(config) => config,
            Err(err) => {
                let mode = if overrides.json {
                    OutputMode::Json
                } else {
                    OutputMode::Text
                };
                render_error(
                    mode,
                    &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
                )?;
                return Err(err);
            }
        };

        debug!(
            data_dir = %config.data_dir.display(),
            base_url = config.base_url.as_str(),
            snapshot = config.snapshot_dir.is_some(),
            "resolved configuration"
        );

        Ok(Self {
            output: OutputMode::from_resolved(&config.resolved_output),
            store: JsonFileStore::new(config.data_dir.clone()),
            config,
        })
    }

    /// The hunt source selected by configuration.
    pub fn source(&self) -> Box<dyn HuntSource> {
        match &self.config.snapshot_dir {
            Some(dir) => Box::new(SnapshotSource::new(dir.clone())),
            None => Box::new(HttpHuntSource::new(
                self.config.base_url.clone(),
                self.config.token.clone(),
                self.config.timeouts,
            )),
        }
    }

    /// Load the state for a read-only command.
    ///
    /// # Errors
    ///
    /// See [`StateStore::load`].
    pub fn read(&self) -> Result<AggregateState, EngineError> {
        self.store.load()
    }

    /// Run one engine operation under the store lock.
    ///
    /// The state is saved only when `op` succeeds, so a failed operation
    /// leaves the stored state untouched.
    ///
    /// # Errors
    ///
    /// Lock, load, and save failures, or whatever `op` returns.
    pub fn mutate<T>(
        &self,
        op: impl FnOnce(&mut AggregateState, &dyn HuntSource) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let _lock = self.store.lock(DEFAULT_LOCK_TIMEOUT)?;
        let mut state = self.store.load()?;
        let source = self.source();
        let value = op(&mut state, source.as_ref())?;
        self.store.save(&state)?;
        Ok(value)
    }
}

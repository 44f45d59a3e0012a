//! Identity of the current user.

use crate::{Config, Error, Result, UserIdentity};
use std::path::PathBuf;

/// Source of the signed-in user
pub trait IdentityProvider {
    /// The signed-in user, or `Error::Unauthenticated`
    fn current_user(&self) -> Result<UserIdentity>;

    fn logout(&mut self) -> Result<()>;
}

/// Identity read from the `[user]` section of the configuration.
///
/// When built with a path, logging out persists the signed-out state there.
#[derive(Clone, Debug)]
pub struct ConfiguredIdentity {
    config: Config,
    path: Option<PathBuf>,
}

impl ConfiguredIdentity {
    /// In-memory identity; logout is not persisted
    pub fn new(config: Config) -> Self {
        Self { config, path: None }
    }

    /// Identity that writes logout back to the config file at `path`
    pub fn persisted(config: Config, path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            path: Some(path.into()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl IdentityProvider for ConfiguredIdentity {
    fn current_user(&self) -> Result<UserIdentity> {
        let user = &self.config.user;
        if !user.signed_in {
            return Err(Error::Unauthenticated);
        }
        Ok(UserIdentity {
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        })
    }

    fn logout(&mut self) -> Result<()> {
        self.config.user.signed_in = false;
        if let Some(path) = &self.path {
            self.config.save_to(path)?;
        }
        tracing::info!("Signed out {}", self.config.user.email);
        Ok(())
    }
}

//! Geolocation port and in-process implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Location;

use crate::error::{ApplicationError, Result};

/// Resolves a street address to a grid location.
///
/// The call may fail; callers get no retries from the resolver itself.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve(&self, street: &str) -> Result<Location>;
}

/// Places every street at a random grid location.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGeoResolver;

impl RandomGeoResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GeoResolver for RandomGeoResolver {
    async fn resolve(&self, _street: &str) -> Result<Location> {
        Ok(Location::random())
    }
}

#[derive(Debug, Default)]
struct InMemoryGeoState {
    streets: HashMap<String, Location>,
    fail_on_resolve: bool,
}

/// Resolver backed by a fixed street map, for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGeoResolver {
    state: Arc<RwLock<InMemoryGeoState>>,
}

impl InMemoryGeoResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the location returned for `street`.
    pub fn insert(&self, street: impl Into<String>, location: Location) {
        self.state
            .write()
            .unwrap()
            .streets
            .insert(street.into(), location);
    }

    /// Configures the resolver to fail every call.
    pub fn set_fail_on_resolve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_resolve = fail;
    }
}

#[async_trait]
impl GeoResolver for InMemoryGeoResolver {
    async fn resolve(&self, street: &str) -> Result<Location> {
        let state = self.state.read().unwrap();

        if state.fail_on_resolve {
            return Err(ApplicationError::Geo {
                street: street.to_string(),
                reason: "geolocation service unavailable".to_string(),
            });
        }

        state
            .streets
            .get(street)
            .copied()
            .ok_or_else(|| ApplicationError::Geo {
                street: street.to_string(),
                reason: "unknown street".to_string(),
            })
    }
}

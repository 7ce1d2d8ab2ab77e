//! At most one apply per route
//!
//! The caller holds a [`RouteLocks`] table for the lifetime of the hosting
//! application and acquires an [`ApplyToken`] before applying. Dropping the
//! token releases the route.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{Error, Result};
use crate::route::RouteId;

type Held = Arc<Mutex<HashSet<RouteId>>>;

fn lock(held: &Held) -> MutexGuard<'_, HashSet<RouteId>> {
    // the set stays consistent even if a holder panicked
    held.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Table of routes with an apply in progress
#[derive(Debug, Clone, Default)]
pub struct RouteLocks {
    held: Held,
}

impl RouteLocks {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a route for applying
    ///
    /// # Errors
    ///
    /// Returns [`Error::RouteBusy`] if a token for this route is alive.
    pub fn acquire(&self, route: &RouteId) -> Result<ApplyToken> {
        if !lock(&self.held).insert(route.clone()) {
            return Err(Error::RouteBusy {
                route: route.to_string(),
            });
        }
        debug!(route = %route, "acquired apply lock");
        Ok(ApplyToken {
            route: route.clone(),
            held: Arc::clone(&self.held),
        })
    }

    /// Whether a route is currently claimed
    #[must_use]
    pub fn is_locked(&self, route: &RouteId) -> bool {
        lock(&self.held).contains(route)
    }
}

/// Proof that the holder may apply to one route
#[derive(Debug)]
pub struct ApplyToken {
    route: RouteId,
    held: Held,
}

impl ApplyToken {
    /// Route this token was acquired for
    #[must_use]
    pub const fn route(&self) -> &RouteId {
        &self.route
    }

    /// Fail unless the token belongs to `route`
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockMismatch`] for any other route.
    pub fn check(&self, route: &RouteId) -> Result<()> {
        if &self.route == route {
            Ok(())
        } else {
            Err(Error::LockMismatch {
                held: self.route.to_string(),
                requested: route.to_string(),
            })
        }
    }
}

impl Drop for ApplyToken {
    fn drop(&mut self) {
        lock(&self.held).remove(&self.route);
        debug!(route = %self.route, "released apply lock");
    }
}

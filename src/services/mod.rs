//! In-process HTTP services activated by `ponzu serve`.
//!
//! Each service registers its routes into a router owned by the serve
//! bootstrapper. Registration happens before the listener binds; the router
//! is not touched afterwards.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;

use crate::store::ConfigStore;

pub mod admin;
pub mod api;
pub mod error;

pub use admin::AdminService;
pub use api::ApiService;

/// Service list used by `ponzu run` when none is given
pub const DEFAULT_SERVICES: &str = "admin,api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Api,
    Admin,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Api => "api",
            Service::Admin => "admin",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown service '{0}'")]
pub struct UnknownService(pub String);

impl FromStr for Service {
    type Err = UnknownService;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "api" => Ok(Service::Api),
            "admin" => Ok(Service::Admin),
            other => Err(UnknownService(other.to_string())),
        }
    }
}

/// Requested services in the order they were listed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSet(Vec<Service>);

impl ServiceSet {
    /// Parse a comma-joined list. Every name must be known; repeats are
    /// dropped so each service registers its routes once.
    pub fn parse(list: &str) -> Result<Self, UnknownService> {
        let mut services = Vec::new();
        for name in list.split(',') {
            let service: Service = name.parse()?;
            if !services.contains(&service) {
                services.push(service);
            }
        }
        Ok(Self(services))
    }

    pub fn iter(&self) -> impl Iterator<Item = Service> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Shared state handed to service handlers
#[derive(Clone)]
pub struct ServiceState {
    pub store: Arc<dyn ConfigStore>,
    pub content_dir: PathBuf,
}

impl ServiceState {
    pub fn new(store: Arc<dyn ConfigStore>, content_dir: PathBuf) -> Self {
        Self { store, content_dir }
    }
}

/// A group of HTTP handlers that registers itself into the server router
pub trait ServiceRegistrar: Send + Sync {
    /// Return `router` with this service's routes added
    fn register(&self, router: Router) -> Router;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_in_listed_order() {
        let set = ServiceSet::parse("api,admin").unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Service::Api, Service::Admin]);

        let set = ServiceSet::parse("admin,api").unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Service::Admin, Service::Api]);
    }

    #[test]
    fn test_default_services() {
        let set = ServiceSet::parse(DEFAULT_SERVICES).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_unknown_name_rejects_whole_list() {
        assert_eq!(
            ServiceSet::parse("admin,api,bogus"),
            Err(UnknownService("bogus".to_string()))
        );
        assert_eq!(ServiceSet::parse(""), Err(UnknownService(String::new())));
        assert_eq!(
            ServiceSet::parse("API"),
            Err(UnknownService("API".to_string()))
        );
    }

    #[test]
    fn test_repeats_are_dropped() {
        let set = ServiceSet::parse("api,api,admin,api").unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Service::Api, Service::Admin]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Service::Api.to_string(), "api");
        assert_eq!(Service::Admin.to_string(), "admin");
    }
}

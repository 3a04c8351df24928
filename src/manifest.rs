//! Route manifests
//!
//! A manifest lists route schemas for the application and for plugins in one TOML
//! file. Bootstrap code and the CLI use it to populate a [`ProtocolRouter`] and a
//! [`PluginRegistry`] without writing registration code by hand.
//!
//! ```toml
//! internal = ["/", "/page", "/page/:id"]
//!
//! [[plugins]]
//! name = "@acme/helm"
//! enabled = true
//! routes = ["/install/:chart", "/"]
//!
//! [[plugins]]
//! name = "metrics"
//! enabled = false
//! routes = ["/dashboard"]
//! ```
//!
//! `enabled` defaults to `true`.

use crate::dispatcher::RouteHandler;
use crate::matcher::{PathPattern, SchemaError};
use crate::plugins::{valid_plugin_name, PluginRegistry, PluginRoute};
use crate::router::ProtocolRouter;
use crate::table::TableOwner;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Routes declared in a manifest file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteManifest {
    /// Internal schemas, in registration order
    pub internal: Vec<String>,
    /// Plugins and their schemas
    pub plugins: Vec<PluginManifest>,
}

/// One plugin entry of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name, `name` or `@scope/name`
    pub name: String,
    /// Whether to enable the plugin after installing it
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Schemas relative to the plugin, in registration order
    #[serde(default)]
    pub routes: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

/// Problem found while validating a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// A schema does not compile
    Schema { owner: TableOwner, error: SchemaError },
    /// Plugin name cannot be addressed by a URL
    InvalidPluginName(String),
    /// The same plugin is listed twice
    DuplicatePlugin(String),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Schema { owner, error } => write!(f, "{}: {}", owner, error),
            ManifestError::InvalidPluginName(name) => write!(f, "invalid plugin name '{}'", name),
            ManifestError::DuplicatePlugin(name) => write!(f, "plugin '{}' listed twice", name),
        }
    }
}

impl std::error::Error for ManifestError {}

impl RouteManifest {
    /// Read a manifest file
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid manifest document.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route manifest: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse route manifest: {}", path.display()))
    }

    /// Parse TOML text
    ///
    /// # Errors
    ///
    /// Returns the TOML deserialisation error.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Total number of schemas in the manifest
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.internal.len() + self.plugins.iter().map(|p| p.routes.len()).sum::<usize>()
    }

    /// Check every schema and plugin name.
    ///
    /// # Errors
    ///
    /// Returns every problem found, in document order.
    pub fn validate(&self) -> Result<(), Vec<ManifestError>> {
        let mut errors = Vec::new();

        for schema in &self.internal {
            if let Err(error) = PathPattern::compile(schema) {
                errors.push(ManifestError::Schema {
                    owner: TableOwner::Internal,
                    error,
                });
            }
        }

        let mut seen = HashSet::new();
        for plugin in &self.plugins {
            if !valid_plugin_name(&plugin.name) {
                errors.push(ManifestError::InvalidPluginName(plugin.name.clone()));
            }
            if !seen.insert(plugin.name.as_str()) {
                errors.push(ManifestError::DuplicatePlugin(plugin.name.clone()));
            }
            for schema in &plugin.routes {
                if let Err(error) = PathPattern::compile(schema) {
                    errors.push(ManifestError::Schema {
                        owner: TableOwner::plugin(plugin.name.as_str()),
                        error,
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Register every route, building handlers with `make_handler(owner, schema)`.
    ///
    /// Plugins are installed into `registry` and enabled when the manifest says so.
    /// Returns the number of routes registered.
    ///
    /// # Errors
    ///
    /// Refuses to register anything if [`RouteManifest::validate`] fails.
    pub fn apply<F>(
        &self,
        router: &ProtocolRouter,
        registry: &PluginRegistry,
        make_handler: F,
    ) -> anyhow::Result<usize>
    where
        F: Fn(&TableOwner, &str) -> RouteHandler,
    {
        if let Err(errors) = self.validate() {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow::bail!("Invalid route manifest: {}", details.join("; "));
        }

        for schema in &self.internal {
            router
                .add_internal_route(schema, make_handler(&TableOwner::Internal, schema))
                .with_context(|| format!("Failed to register internal schema {}", schema))?;
        }

        for plugin in &self.plugins {
            let owner = TableOwner::plugin(plugin.name.as_str());
            let routes = plugin
                .routes
                .iter()
                .map(|schema| PluginRoute::new(schema.as_str(), make_handler(&owner, schema)))
                .collect();
            registry.install(&plugin.name, routes);
            if plugin.enabled {
                registry.enable(&plugin.name);
            }
        }

        let registered = self.route_count();
        info!(
            internal = self.internal.len(),
            plugins = self.plugins.len(),
            routes = registered,
            "Route manifest applied"
        );
        Ok(registered)
    }
}

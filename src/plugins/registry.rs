use crate::dispatcher::RouteHandler;
use crate::matcher::PathPattern;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A `(schema, handler)` pair contributed by a plugin
#[derive(Debug, Clone)]
pub struct PluginRoute {
    /// Path schema relative to the plugin (e.g. `/install/:chart`)
    pub path_schema: String,
    /// Handler to invoke on match
    pub handler: RouteHandler,
}

impl PluginRoute {
    pub fn new(path_schema: impl Into<String>, handler: RouteHandler) -> Self {
        Self {
            path_schema: path_schema.into(),
            handler,
        }
    }
}

/// Read-only view of enabled plugins' routes
pub trait PluginHandlerProvider: Send + Sync {
    /// Current routes of `plugin_name`, or `None` if it is not installed or not enabled
    fn handlers_for(&self, plugin_name: &str) -> Option<Arc<[PluginRoute]>>;
}

/// Plugin names are one URL segment, or two for `@scope/name`.
///
/// An unscoped name starting with `@` is rejected: the router would always join it
/// with the following segment, so it could never be addressed.
#[must_use]
pub fn valid_plugin_name(name: &str) -> bool {
    let segment_ok = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '~' | '-'))
    };
    match name.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, rest)) => segment_ok(scope) && segment_ok(rest),
            None => false,
        },
        None => segment_ok(name),
    }
}

#[derive(Debug, Clone)]
struct PluginState {
    enabled: bool,
    routes: Arc<[PluginRoute]>,
}

type Snapshot = HashMap<Arc<str>, PluginState>;

/// In-memory plugin registry with snapshot reads
#[derive(Default)]
pub struct PluginRegistry {
    plugins: ArcSwap<Snapshot>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("installed", &self.installed())
            .field("enabled", &self.enabled_plugins())
            .finish()
    }
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or reinstall) a plugin with its routes. A fresh install starts
    /// disabled; a reinstall keeps the previous enabled flag.
    ///
    /// Returns `false` and installs nothing if `name` is not a valid plugin name.
    /// Routes with malformed schemas are kept but reported here, once; routing
    /// skips them.
    pub fn install(&self, name: &str, routes: Vec<PluginRoute>) -> bool {
        if !valid_plugin_name(name) {
            warn!(plugin = %name, "Refusing to install plugin with invalid name");
            return false;
        }

        for route in &routes {
            if let Err(e) = PathPattern::compile(&route.path_schema) {
                warn!(
                    plugin = %name,
                    schema = %route.path_schema,
                    error = %e,
                    "Plugin route has invalid schema and will never match"
                );
            }
        }

        let routes: Arc<[PluginRoute]> = Arc::from(routes);
        let route_count = routes.len();
        self.plugins.rcu(|current| {
            let mut next = Snapshot::clone(current);
            let enabled = current.get(name).is_some_and(|p| p.enabled);
            next.insert(
                Arc::from(name),
                PluginState {
                    enabled,
                    routes: Arc::clone(&routes),
                },
            );
            next
        });
        info!(plugin = %name, route_count = route_count, "Plugin installed");
        true
    }

    /// Remove a plugin entirely. Returns `false` if it was not installed.
    pub fn uninstall(&self, name: &str) -> bool {
        let mut removed = false;
        self.plugins.rcu(|current| {
            let mut next = Snapshot::clone(current);
            removed = next.remove(name).is_some();
            next
        });
        if removed {
            info!(plugin = %name, "Plugin uninstalled");
        }
        removed
    }

    /// Enable an installed plugin. Returns `false` if it is not installed.
    pub fn enable(&self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Disable an installed plugin. Returns `false` if it is not installed.
    pub fn disable(&self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        self.plugins.rcu(|current| {
            let mut next = Snapshot::clone(current);
            found = match next.get_mut(name) {
                Some(state) => {
                    state.enabled = enabled;
                    true
                }
                None => false,
            };
            next
        });
        if found {
            info!(plugin = %name, enabled = enabled, "Plugin state changed");
        } else {
            debug!(plugin = %name, enabled = enabled, "Plugin not installed");
        }
        found
    }

    /// Whether `name` is installed and enabled
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.plugins.load().get(name).is_some_and(|p| p.enabled)
    }

    /// Names of all installed plugins, sorted
    #[must_use]
    pub fn installed(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.load().keys().map(|k| k.to_string()).collect();
        names.sort();
        names
    }

    /// Names of enabled plugins, sorted
    #[must_use]
    pub fn enabled_plugins(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .plugins
            .load()
            .iter()
            .filter(|(_, p)| p.enabled)
            .map(|(k, _)| k.to_string())
            .collect();
        names.sort();
        names
    }
}

impl PluginHandlerProvider for PluginRegistry {
    fn handlers_for(&self, plugin_name: &str) -> Option<Arc<[PluginRoute]>> {
        self.plugins
            .load()
            .get(plugin_name)
            .filter(|p| p.enabled)
            .map(|p| Arc::clone(&p.routes))
    }
}

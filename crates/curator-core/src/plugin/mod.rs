//! Plugin composition from declarative configuration.
//!
//! A configuration tree is a JSON object with a `type` field naming a
//! registered constructor; any other field whose value is itself an object
//! with a `type` is built first and handed to the parent as a nested plugin.
//!
//! ```text
//! {"type": "and",
//!  "matcher1": {"type": "circle", "radius_arcsec": 10},
//!  "matcher2": {"type": "ignore_no_name",
//!               "matcher": {"type": "levenshtein", "max_distance": 3}}}
//! ```

pub mod matcher;
pub mod solver;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::ConfigurationError;

pub use matcher::{default_matcher_registry, Matcher, MatcherSpec};
pub use solver::{default_solver_registry, Solver, SolverSpec};

/// A registered constructor. It consumes the arguments it needs from `args`.
pub type Constructor<T> =
    Box<dyn Fn(&mut PluginArgs<T>) -> Result<T, ConfigurationError> + Send + Sync>;

/// Name-to-constructor table for one kind of plugin.
pub struct PluginRegistry<T> {
    kind: &'static str,
    constructors: BTreeMap<String, Constructor<T>>,
}

impl<T> PluginRegistry<T> {
    /// Create an empty registry. `kind` is used in error messages.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            constructors: BTreeMap::new(),
        }
    }

    /// Register a constructor under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&mut PluginArgs<T>) -> Result<T, ConfigurationError> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&mut PluginArgs<T>) -> Result<T, ConfigurationError> + Send + Sync + 'static,
    {
        self.register(name, constructor);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl<T> fmt::Debug for PluginRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("kind", &self.kind)
            .field("names", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A resolved constructor argument.
#[derive(Debug)]
pub enum PluginArg<T> {
    /// A nested plugin built from a `{type: ..}` object.
    Plugin(T),
    /// Any other value, passed through unchanged.
    Value(Value),
}

/// Keyword arguments handed to a constructor.
#[derive(Debug)]
pub struct PluginArgs<T> {
    plugin: String,
    args: BTreeMap<String, PluginArg<T>>,
}

impl<T> PluginArgs<T> {
    fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            args: BTreeMap::new(),
        }
    }

    /// Type name of the plugin being constructed.
    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    /// Take a nested plugin argument.
    pub fn plugin(&mut self, name: &str) -> Result<T, ConfigurationError> {
        match self.take(name)? {
            PluginArg::Plugin(plugin) => Ok(plugin),
            PluginArg::Value(value) => Err(self.invalid(
                name,
                format!("expected a nested plugin configuration, got {}", value),
            )),
        }
    }

    /// Take a raw value argument.
    pub fn value(&mut self, name: &str) -> Result<Value, ConfigurationError> {
        match self.take(name)? {
            PluginArg::Value(value) => Ok(value),
            PluginArg::Plugin(_) => {
                Err(self.invalid(name, "expected a value, got a plugin configuration"))
            }
        }
    }

    /// Take a numeric argument.
    pub fn f64(&mut self, name: &str) -> Result<f64, ConfigurationError> {
        let value = self.value(name)?;
        value
            .as_f64()
            .ok_or_else(|| self.invalid(name, format!("expected a number, got {}", value)))
    }

    /// Take a non-negative integer argument.
    pub fn usize(&mut self, name: &str) -> Result<usize, ConfigurationError> {
        let value = self.value(name)?;
        value
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| {
                self.invalid(name, format!("expected a non-negative integer, got {}", value))
            })
    }

    /// Take an optional boolean argument, falling back to `default`.
    pub fn bool_or(&mut self, name: &str, default: bool) -> Result<bool, ConfigurationError> {
        match self.args.remove(name) {
            None => Ok(default),
            Some(PluginArg::Value(Value::Bool(flag))) => Ok(flag),
            Some(_) => Err(self.invalid(name, "expected true or false")),
        }
    }

    /// Build an invalid-argument error for this plugin.
    pub fn invalid(&self, name: &str, reason: impl Into<String>) -> ConfigurationError {
        ConfigurationError::InvalidArgument {
            plugin: self.plugin.clone(),
            argument: name.to_string(),
            reason: reason.into(),
        }
    }

    fn take(&mut self, name: &str) -> Result<PluginArg<T>, ConfigurationError> {
        self.args
            .remove(name)
            .ok_or_else(|| ConfigurationError::MissingArgument {
                plugin: self.plugin.clone(),
                argument: name.to_string(),
            })
    }

    /// Reject arguments the constructor did not consume.
    fn finish(self) -> Result<(), ConfigurationError> {
        match self.args.into_keys().next() {
            Some(argument) => Err(ConfigurationError::UnexpectedArgument {
                plugin: self.plugin,
                argument,
            }),
            None => Ok(()),
        }
    }
}

/// Build a plugin tree from `config` using `registry`.
///
/// The `type` is checked before anything else; nested plugins are built
/// depth-first before their parent's constructor runs.
pub fn build<T>(config: &Value, registry: &PluginRegistry<T>) -> Result<T, ConfigurationError> {
    let Value::Object(fields) = config else {
        return Err(ConfigurationError::NotAnObject(config.to_string()));
    };
    let type_name = fields
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ConfigurationError::MissingType)?;
    let constructor =
        registry
            .constructors
            .get(type_name)
            .ok_or_else(|| ConfigurationError::UnknownPluginType {
                kind: registry.kind.to_string(),
                name: type_name.to_string(),
            })?;

    let mut args = PluginArgs::new(type_name);
    for (name, value) in fields {
        if name == "type" {
            continue;
        }
        let arg = if is_plugin_config(value) {
            PluginArg::Plugin(build(value, registry)?)
        } else {
            PluginArg::Value(value.clone())
        };
        args.args.insert(name.clone(), arg);
    }

    let plugin = constructor(&mut args)?;
    args.finish()?;
    Ok(plugin)
}

fn is_plugin_config(value: &Value) -> bool {
    matches!(value, Value::Object(fields) if fields.contains_key("type"))
}

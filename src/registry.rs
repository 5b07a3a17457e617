//! The set of configured models, persisted as YAML.
//!
//! The file maps each model name to its [`ModelConfig`].  The registry keeps the configs,
//! a live [`Model`] for each, and the name of the default model together behind one lock,
//! so readers never observe a config without its model or a default that was removed.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use utf8path::Path;

use crate::client::{DEFAULT_TIMEOUT, http_client};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::types::ModelConfig;

#[derive(Debug, Default)]
struct RegistryState {
    configs: BTreeMap<String, ModelConfig>,
    models: BTreeMap<String, Model>,
    default: Option<String>,
}

fn mark_default(configs: &mut BTreeMap<String, ModelConfig>, name: &str) {
    for (key, config) in configs.iter_mut() {
        config.default_enabled = key == name;
    }
}

/// Registry of configured models backed by a YAML file.
#[derive(Debug)]
pub struct ModelRegistry {
    path: Path<'static>,
    http: reqwest::Client,
    timeout: Duration,
    state: RwLock<RegistryState>,
}

impl ModelRegistry {
    /// Open the registry at `path`, creating an empty file if none exists.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_TIMEOUT)
    }

    /// Open the registry with a custom per-call timeout for every model.
    pub fn open_with_timeout(path: &Path, timeout: Duration) -> Result<Self> {
        let registry = Self {
            path: path.clone().into_owned(),
            http: http_client(timeout)?,
            timeout,
            state: RwLock::new(RegistryState::default()),
        };
        if registry.path.exists() {
            registry.load()?;
        } else {
            registry.save(&registry.read().configs)?;
        }
        Ok(registry)
    }

    /// The path of the backing file.
    pub fn path(&self) -> &Path<'static> {
        &self.path
    }

    fn load(&self) -> Result<()> {
        let data = std::fs::read_to_string(&self.path).map_err(|err| {
            Error::io(format!("failed to read config file {}", self.path.as_str()), err)
        })?;
        let configs: BTreeMap<String, ModelConfig> = if data.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_yaml::from_str::<Option<BTreeMap<String, ModelConfig>>>(&data)?
                .unwrap_or_default()
        };

        let mut state = self.write();
        *state = RegistryState::default();
        for (name, mut config) in configs {
            config.name = name.clone();
            let model = self.build(&config);
            state.models.insert(name.clone(), model);
            state.configs.insert(name, config);
        }
        let default = state
            .configs
            .values()
            .find(|config| config.default_enabled)
            .or_else(|| state.configs.values().next())
            .map(|config| config.name.clone());
        state.default = default;
        tracing::debug!(
            path = %self.path.as_str(),
            models = state.configs.len(),
            default = ?state.default,
            "loaded model registry"
        );
        Ok(())
    }

    fn save(&self, configs: &BTreeMap<String, ModelConfig>) -> Result<()> {
        if let Some(parent) = std::path::Path::new(self.path.as_str()).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    Error::io(
                        format!("failed to create config directory {}", parent.display()),
                        err,
                    )
                })?;
            }
        }
        let data = serde_yaml::to_string(configs)?;
        std::fs::write(&self.path, data).map_err(|err| {
            tracing::warn!(path = %self.path.as_str(), error = %err, "failed to write config file");
            Error::io(format!("failed to write config file {}", self.path.as_str()), err)
        })
    }

    fn build(&self, config: &ModelConfig) -> Model {
        Model::with_http_client(config.clone(), self.http.clone(), self.timeout)
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Persist `configs`, then make them the in-memory state.
    ///
    /// If the write fails the state is left exactly as it was.
    fn commit(
        &self,
        state: &mut RegistryState,
        configs: BTreeMap<String, ModelConfig>,
        default: Option<String>,
    ) -> Result<()> {
        self.save(&configs)?;
        state.models = configs
            .iter()
            .map(|(name, config)| (name.clone(), self.build(config)))
            .collect();
        state.configs = configs;
        state.default = default;
        Ok(())
    }

    /// Add a new model.
    ///
    /// The first model added becomes the default, as does any model added with
    /// `default_enabled` set.
    pub fn add(&self, config: ModelConfig) -> Result<()> {
        let mut state = self.write();
        if state.configs.contains_key(&config.name) {
            return Err(Error::already_exists(format!(
                "model {} already exists",
                config.name
            )));
        }
        let name = config.name.clone();
        let make_default = config.default_enabled || state.configs.is_empty();
        let mut configs = state.configs.clone();
        configs.insert(name.clone(), config);
        let default = if make_default {
            mark_default(&mut configs, &name);
            Some(name.clone())
        } else {
            state.default.clone()
        };
        self.commit(&mut state, configs, default)?;
        tracing::debug!(model = %name, default = make_default, "added model");
        Ok(())
    }

    /// Remove a model.
    ///
    /// If it was the default, the alphabetically-first remaining model takes its place.
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut state = self.write();
        let mut configs = state.configs.clone();
        if configs.remove(name).is_none() {
            return Err(not_found(name));
        }
        let mut default = state.default.clone();
        if default.as_deref() == Some(name) {
            default = configs.keys().next().cloned();
            if let Some(next) = &default {
                mark_default(&mut configs, next);
            }
        }
        self.commit(&mut state, configs, default)?;
        tracing::debug!(model = %name, "removed model");
        Ok(())
    }

    /// Make `name` the default model.
    pub fn set_default(&self, name: &str) -> Result<()> {
        let mut state = self.write();
        if !state.configs.contains_key(name) {
            return Err(not_found(name));
        }
        let mut configs = state.configs.clone();
        mark_default(&mut configs, name);
        self.commit(&mut state, configs, Some(name.to_string()))
    }

    /// Replace the config of an existing model and rebuild it.
    ///
    /// The stored name is always `name`; whether the model is the default does not change.
    pub fn update(&self, name: &str, mut config: ModelConfig) -> Result<()> {
        let mut state = self.write();
        let Some(existing) = state.configs.get(name) else {
            return Err(not_found(name));
        };
        config.name = name.to_string();
        config.default_enabled = existing.default_enabled;
        let mut configs = state.configs.clone();
        configs.insert(name.to_string(), config);
        let default = state.default.clone();
        self.commit(&mut state, configs, default)
    }

    /// The model called `name`.
    pub fn get(&self, name: &str) -> Result<Model> {
        self.read()
            .models
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    /// The default model.
    pub fn default_model(&self) -> Result<Model> {
        let state = self.read();
        let Some(name) = state.default.as_deref() else {
            return Err(Error::validation(
                "no default model set; add one with `ai model add`",
                Some("model".to_string()),
            ));
        };
        state.models.get(name).cloned().ok_or_else(|| not_found(name))
    }

    /// The name of the default model, if any.
    pub fn default_name(&self) -> Option<String> {
        self.read().default.clone()
    }

    /// The config of the model called `name`.
    pub fn config(&self, name: &str) -> Result<ModelConfig> {
        self.read()
            .configs
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    /// Every config, sorted by name.
    pub fn list(&self) -> Vec<ModelConfig> {
        self.read().configs.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.read().configs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.read().configs.len()
    }
}

fn not_found(name: &str) -> Error {
    Error::not_found(name, Some("model".to_string()), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatOptions;

    fn registry_in(dir: &tempfile::TempDir) -> ModelRegistry {
        let path = dir.path().join("config.yaml");
        let path = Path::try_from(path).unwrap();
        ModelRegistry::open(&path).unwrap()
    }

    #[test]
    fn open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        assert!(registry.is_empty());
        assert!(registry.path().exists());
        assert!(registry.default_name().is_none());
        assert!(registry.default_model().unwrap_err().is_validation());
    }

    #[test]
    fn first_model_becomes_default() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry
            .add(ModelConfig::new("gpt-4o", "https://api.openai.com", "k1"))
            .unwrap();
        registry
            .add(ModelConfig::new("deepseek", "https://api.deepseek.com", "k2"))
            .unwrap();
        assert_eq!(registry.default_name().as_deref(), Some("gpt-4o"));
        assert_eq!(registry.default_model().unwrap().name(), "gpt-4o");
        assert_eq!(registry.len(), 2);

        let names: Vec<_> = registry.list().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["deepseek", "gpt-4o"]);
    }

    #[test]
    fn default_enabled_takes_over() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry
            .add(ModelConfig::new("a", "http://localhost", "k"))
            .unwrap();
        registry
            .add(ModelConfig::new("b", "http://localhost", "k").with_default_enabled(true))
            .unwrap();
        assert_eq!(registry.default_name().as_deref(), Some("b"));
        assert!(!registry.config("a").unwrap().default_enabled);
        assert!(registry.config("b").unwrap().default_enabled);
    }

    #[test]
    fn duplicate_add_fails() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry
            .add(ModelConfig::new("a", "http://localhost", "k"))
            .unwrap();
        let err = registry
            .add(ModelConfig::new("a", "http://other", "k"))
            .unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(registry.config("a").unwrap().url, "http://localhost");
    }

    #[test]
    fn remove_reassigns_default() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        for name in ["m1", "m3", "m2"] {
            registry
                .add(ModelConfig::new(name, "http://localhost", "k"))
                .unwrap();
        }
        assert_eq!(registry.default_name().as_deref(), Some("m1"));
        registry.remove("m1").unwrap();
        assert_eq!(registry.default_name().as_deref(), Some("m2"));
        assert!(registry.get("m1").unwrap_err().is_not_found());
        assert!(registry.remove("m1").unwrap_err().is_not_found());

        registry.remove("m2").unwrap();
        registry.remove("m3").unwrap();
        assert!(registry.default_name().is_none());
    }

    #[test]
    fn set_default_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let registry = registry_in(&dir);
            registry
                .add(ModelConfig::new("a", "http://localhost", "k"))
                .unwrap();
            registry
                .add(ModelConfig::new("b", "http://localhost", "k"))
                .unwrap();
            registry.set_default("b").unwrap();
            assert!(registry.set_default("zzz").unwrap_err().is_not_found());
        }
        let registry = registry_in(&dir);
        assert_eq!(registry.default_name().as_deref(), Some("b"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn update_rebuilds_model() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry
            .add(ModelConfig::new("a", "http://localhost", "k"))
            .unwrap();
        let options = ChatOptions::default().with_temperature(0.7).with_stream(false);
        let config = registry
            .config("a")
            .unwrap()
            .with_chat_options(Some(options.clone()));
        registry.update("a", config).unwrap();
        let model = registry.get("a").unwrap();
        assert_eq!(model.default_options(), options);
        assert!(registry.config("a").unwrap().default_enabled);

        let err = registry
            .update("missing", ModelConfig::new("missing", "http://localhost", "k"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn loads_without_default_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "zeta:\n  name: zeta\n  url: http://localhost\n  api_key: k\nalpha:\n  name: alpha\n  url: http://localhost\n  api_key: k\n",
        )
        .unwrap();
        let registry = registry_in(&dir);
        assert_eq!(registry.default_name().as_deref(), Some("alpha"));
    }

    #[test]
    fn empty_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "").unwrap();
        let registry = registry_in(&dir);
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(&dir);
        registry
            .add(ModelConfig::new("a", "http://localhost", "k"))
            .unwrap();
        registry
            .add(ModelConfig::new("b", "http://localhost", "k"))
            .unwrap();

        // A directory in place of the file makes every write fail.
        let path = dir.path().join("config.yaml");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = registry
            .add(ModelConfig::new("c", "http://localhost", "k"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "{err:?}");
        assert!(registry.get("c").unwrap_err().is_not_found());
        assert_eq!(registry.len(), 2);

        assert!(registry.set_default("b").is_err());
        assert_eq!(registry.default_name().as_deref(), Some("a"));
        assert!(registry.config("a").unwrap().default_enabled);
        assert!(!registry.config("b").unwrap().default_enabled);

        assert!(registry.remove("a").is_err());
        assert!(registry.get("a").is_ok());
        assert_eq!(registry.default_name().as_deref(), Some("a"));

        let changed = registry
            .config("b")
            .unwrap()
            .with_chat_options(Some(ChatOptions::default().with_max_tokens(1)));
        assert!(registry.update("b", changed).is_err());
        assert!(registry.config("b").unwrap().default_chat_options.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "- not\n- a map\n").unwrap();
        let path = Path::try_from(path).unwrap();
        let err = ModelRegistry::open(&path).unwrap_err();
        assert!(err.is_serialization());
    }
}

//! Running parsed commands against the registry and session store.

use std::io::Write;

use tokio_util::sync::CancellationToken;

use crate::cli::args::AiArgs;
use crate::cli::commands::{Command, help_text};
use crate::cli::table::{model_table, session_table};
use crate::error::Result;
use crate::fanout::ask_many;
use crate::files;
use crate::history::SessionStore;
use crate::model::{FileContext, Model};
use crate::registry::ModelRegistry;
use crate::render::Renderer;
use crate::types::{ChatOptions, ModelConfig};

/// Name of the registry file inside the configuration directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// Name of the session store directory inside the configuration directory.
pub const HISTORY_DIR: &str = "history";

/// The `ai` application: flags, models and sessions.
///
/// Answers go to the [`Renderer`]; listings and confirmations go to the writer passed to
/// [`App::run`].
pub struct App {
    args: AiArgs,
    registry: ModelRegistry,
    sessions: SessionStore,
}

impl App {
    /// Open the registry and session store under the configuration directory.
    pub fn open(args: AiArgs) -> Result<Self> {
        let home = args.home_dir()?;
        let registry = ModelRegistry::open(&home.join(CONFIG_FILE))?;
        let sessions = SessionStore::open(&home.join(HISTORY_DIR))?;
        tracing::debug!(home = %home.as_str(), "opened configuration");
        Ok(Self::from_parts(args, registry, sessions))
    }

    pub fn from_parts(args: AiArgs, registry: ModelRegistry, sessions: SessionStore) -> Self {
        Self {
            args,
            registry,
            sessions,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one command.
    pub async fn run(
        &mut self,
        command: Command,
        cancel: &CancellationToken,
        renderer: &mut dyn Renderer,
        out: &mut dyn Write,
    ) -> Result<()> {
        match command {
            Command::Help => {
                writeln!(out, "{}", help_text())?;
            }
            Command::Ask { question } => self.ask(&question, cancel, renderer).await?,
            Command::File { path, question } => {
                self.ask_file(&path, &question, cancel, renderer, out)
                    .await?
            }
            Command::Multi { models, question } => {
                writeln!(out, "Question: {question}\n")?;
                for result in ask_many(&self.registry, &models, &question, cancel).await {
                    writeln!(out, "===== Model: {} =====", result.model)?;
                    match result.result {
                        Ok(answer) => writeln!(out, "{answer}")?,
                        Err(err) => writeln!(out, "Error: {err}")?,
                    }
                    writeln!(out)?;
                }
            }
            Command::NewSession => {
                self.sessions.new_session()?;
                writeln!(out, "Started a new session.")?;
            }
            Command::SessionList => {
                let sessions = self.sessions.list()?;
                if sessions.is_empty() {
                    writeln!(out, "No history sessions found")?;
                } else {
                    write!(out, "{}", session_table(&sessions, self.sessions.current_id()))?;
                    writeln!(out, "✓ indicates current session")?;
                    writeln!(out, "Use 'ai session switch <number or ID>' to switch session")?;
                    writeln!(out, "Use 'ai session delete <number or ID>' to delete session")?;
                }
            }
            Command::SessionSwitch(identifier) => {
                let id = self.sessions.resolve(&identifier)?;
                self.sessions.switch(&id)?;
                writeln!(out, "Switched to session: {id}")?;
            }
            Command::SessionDelete(identifier) => {
                let id = self.sessions.resolve(&identifier)?;
                self.sessions.delete(&id)?;
                writeln!(out, "Deleted session: {id}")?;
            }
            Command::ModelList => {
                let configs = self.registry.list();
                if configs.is_empty() {
                    writeln!(
                        out,
                        "No models configured. Use 'ai model add' to add a model."
                    )?;
                } else {
                    let default = self.registry.default_name();
                    write!(out, "{}", model_table(&configs, default.as_deref()))?;
                }
            }
            Command::ModelAdd { name, url, api_key } => {
                let config = ModelConfig::new(&name, url, api_key)
                    .with_default_enabled(self.args.default)
                    .with_chat_options(self.args.options_for_new_model()?);
                self.registry.add(config)?;
                writeln!(out, "Model '{name}' added successfully")?;
            }
            Command::ModelRemove(name) => {
                self.registry.remove(&name)?;
                writeln!(out, "Model '{name}' removed successfully")?;
            }
            Command::ModelSet(name) => {
                self.registry.set_default(&name)?;
                writeln!(out, "Set '{name}' as the default model")?;
            }
            Command::ModelOptions(name) => {
                let config = self.registry.config(&name)?;
                let base = config.default_chat_options.clone().unwrap_or_default();
                let options = self.args.apply_overrides(base)?;
                let config = config.with_chat_options(Some(options.clone()));
                self.registry.update(&name, config)?;
                if self.args.default {
                    self.registry.set_default(&name)?;
                }
                let is_default = self.registry.default_name().as_deref() == Some(name.as_str());
                writeln!(out, "Updated options for model '{name}'")?;
                writeln!(
                    out,
                    "Temperature: {:.2}, MaxTokens: {}, Stream: {}, Default: {}",
                    options.temperature, options.max_tokens, options.stream, is_default
                )?;
            }
        }
        Ok(())
    }

    fn model(&self) -> Result<Model> {
        match &self.args.model {
            Some(name) => self.registry.get(name),
            None => self.registry.default_model(),
        }
    }

    fn options_for(&self, model: &Model) -> Result<ChatOptions> {
        self.args.apply_overrides(model.default_options())
    }

    async fn ask(
        &mut self,
        question: &str,
        cancel: &CancellationToken,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        let model = self.model()?;
        let mut options = self.options_for(&model)?;
        if !self.args.no_history && !self.sessions.is_empty() {
            options = options.with_history(self.sessions.history());
        }
        let stream = options.stream;
        let answer = model.ask(question, None, options, cancel, renderer).await?;
        if !stream {
            show_answer(renderer, &answer);
        }
        self.sessions.record_turn(question, &answer)
    }

    async fn ask_file(
        &self,
        path: &str,
        question: &str,
        cancel: &CancellationToken,
        renderer: &mut dyn Renderer,
        out: &mut dyn Write,
    ) -> Result<()> {
        let content = files::read_text_file(path)?;
        let language = files::detect_language(path);
        let model = self.model()?;
        let options = self.options_for(&model)?;
        let stream = options.stream;
        writeln!(out, "File: {path} ({language})")?;
        writeln!(out, "Question: {question}\n")?;
        out.flush()?;
        let file = FileContext::new(path, content);
        let answer = model
            .ask(question, Some(&file), options, cancel, renderer)
            .await?;
        if !stream {
            show_answer(renderer, &answer);
        }
        Ok(())
    }
}

fn show_answer(renderer: &mut dyn Renderer, answer: &str) {
    renderer.print_text(answer);
    renderer.finish_response();
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("registry", &self.registry.path().as_str())
            .field("session", &self.sessions.current_id())
            .finish()
    }
}

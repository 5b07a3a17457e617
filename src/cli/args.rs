//! Command-line flags for the `ai` binary.

use arrrg_derive::CommandLine;
use utf8path::Path;

use crate::error::{Error, Result};
use crate::types::ChatOptions;

/// Environment variable that overrides the configuration directory.
pub const HOME_ENV: &str = "AI_HOME";

/// Directory under the user's home that holds configuration and history.
pub const HOME_DIR_NAME: &str = ".ai";

/// Max tokens saved by `ai model add` when only some option flags are given.
pub const ADD_DEFAULT_MAX_TOKENS: u32 = 2048;

/// Command-line arguments for the `ai` tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct AiArgs {
    /// Model to ask instead of the default.
    #[arrrg(optional, "Model to ask (default: the configured default model)", "MODEL")]
    pub model: Option<String>,

    /// Configuration directory.
    #[arrrg(optional, "Configuration directory (default: $AI_HOME or ~/.ai)", "DIR")]
    pub home: Option<String>,

    /// Sampling temperature, kept as text so the struct stays `Eq`.
    #[arrrg(optional, "Sampling temperature (0.0-2.0)", "TEMP")]
    pub temperature: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response", "TOKENS")]
    pub max_tokens: Option<u32>,

    #[arrrg(flag, "Stream the response as it is generated")]
    pub stream: bool,

    #[arrrg(flag, "Wait for the complete response")]
    pub no_stream: bool,

    /// Used by `model add` and `model options`.
    #[arrrg(flag, "Make the model the default")]
    pub default: bool,

    #[arrrg(flag, "Don't send conversation history")]
    pub no_history: bool,

    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    #[arrrg(flag, "Log debug information to stderr")]
    pub verbose: bool,
}

impl AiArgs {
    /// The `--temperature` value, if given.
    pub fn temperature(&self) -> Result<Option<f64>> {
        self.temperature
            .as_deref()
            .map(|value| parse_f64_in_range(value, 0.0, 2.0))
            .transpose()
            .map_err(|err| {
                Error::validation(
                    format!("--temperature {err}"),
                    Some("temperature".to_string()),
                )
            })
    }

    /// The streaming mode requested by `--stream`/`--no-stream`, if any.
    pub fn stream(&self) -> Result<Option<bool>> {
        match (self.stream, self.no_stream) {
            (true, true) => Err(Error::validation(
                "--stream and --no-stream are mutually exclusive",
                Some("stream".to_string()),
            )),
            (true, false) => Ok(Some(true)),
            (false, true) => Ok(Some(false)),
            (false, false) => Ok(None),
        }
    }

    /// True if any of the chat option flags were given.
    pub fn has_option_flags(&self) -> bool {
        self.temperature.is_some() || self.max_tokens.is_some() || self.stream || self.no_stream
    }

    /// Apply the chat option flags on top of `options`.
    pub fn apply_overrides(&self, mut options: ChatOptions) -> Result<ChatOptions> {
        if let Some(temperature) = self.temperature()? {
            options = options.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }
        if let Some(stream) = self.stream()? {
            options = options.with_stream(stream);
        }
        Ok(options)
    }

    /// The options `ai model add` saves: none unless an option flag was given.
    pub fn options_for_new_model(&self) -> Result<Option<ChatOptions>> {
        if !self.has_option_flags() {
            return Ok(None);
        }
        let base = ChatOptions::default().with_max_tokens(ADD_DEFAULT_MAX_TOKENS);
        self.apply_overrides(base).map(Some)
    }

    /// The configuration directory: `--home`, then `$AI_HOME`, then `~/.ai`.
    pub fn home_dir(&self) -> Result<Path<'static>> {
        if let Some(home) = &self.home {
            return Ok(Path::from(home.as_str()).into_owned());
        }
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.is_empty() {
                return Ok(Path::from(home.as_str()).into_owned());
            }
        }
        let Some(home) = dirs::home_dir() else {
            return Err(Error::validation(
                "cannot determine the home directory; pass --home",
                Some("home".to_string()),
            ));
        };
        let home = Path::try_from(home).map_err(|_| {
            Error::validation(
                "home directory is not valid UTF-8; pass --home",
                Some("home".to_string()),
            )
        })?;
        Ok(home.join(HOME_DIR_NAME).into_owned())
    }
}

fn parse_f64_in_range(value: &str, min: f64, max: f64) -> std::result::Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| format!("expects a value between {min} and {max}"))?;
    if parsed.is_finite() && parsed >= min && parsed <= max {
        Ok(parsed)
    } else {
        Err(format!("expects a value between {min} and {max}"))
    }
}

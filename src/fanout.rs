//! Asking several models the same question at once.
//!
//! Each model gets its own task and its own request; the only thing the tasks share is the
//! registry's HTTP connection pool.  Results are returned in the order the models finish,
//! not the order they were named.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::observability::{FANOUT_FAILURES, FANOUT_WORKERS};
use crate::registry::ModelRegistry;
use crate::render::SilentRenderer;

/// One model's answer, or why it has none.
#[derive(Debug)]
pub struct FanoutResult {
    pub model: String,
    pub result: Result<String>,
}

/// Ask every model in `names` the question concurrently, with streaming disabled.
///
/// A name that is not in the registry produces a `NotFound` result for that name; it does
/// not stop the others.  No session history is sent.
pub async fn ask_many(
    registry: &ModelRegistry,
    names: &[String],
    question: &str,
    cancel: &CancellationToken,
) -> Vec<FanoutResult> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    for name in names {
        let model = match registry.get(name) {
            Ok(model) => model,
            Err(err) => {
                FANOUT_FAILURES.click();
                let _ = tx.send(FanoutResult {
                    model: name.clone(),
                    result: Err(err),
                });
                continue;
            }
        };
        FANOUT_WORKERS.click();
        let tx = tx.clone();
        let question = question.to_string();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let options = model.default_options().with_stream(false);
            let result = model
                .ask(&question, None, options, &cancel, &mut SilentRenderer)
                .await;
            if let Err(err) = &result {
                FANOUT_FAILURES.click();
                tracing::debug!(model = %model.name(), error = %err, "fan-out request failed");
            }
            let _ = tx.send(FanoutResult {
                model: model.name().to_string(),
                result,
            });
        });
    }
    drop(tx);

    let mut results = Vec::with_capacity(names.len());
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    if results.len() < names.len() {
        tracing::warn!(
            expected = names.len(),
            received = results.len(),
            "some fan-out workers exited without a result"
        );
    }
    results
}

/// Split a comma-separated model list, dropping blanks.
pub fn parse_model_list(list: &str) -> Result<Vec<String>> {
    let names: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();
    if names.is_empty() {
        return Err(Error::validation(
            "please specify at least one model",
            Some("models".to_string()),
        ));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelConfig;
    use utf8path::Path;

    #[test]
    fn model_list() {
        assert_eq!(
            parse_model_list("gpt-4o, claude ,,deepseek").unwrap(),
            vec!["gpt-4o", "claude", "deepseek"]
        );
        assert!(parse_model_list(" , ").unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn unknown_models_report_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = Path::try_from(dir.path().join("config.yaml")).unwrap();
        let registry = ModelRegistry::open(&path).unwrap();
        registry
            .add(ModelConfig::new("claude-echo", "http://localhost", "k"))
            .unwrap();

        let names = vec!["missing".to_string(), "claude-echo".to_string()];
        let results = ask_many(&registry, &names, "hi", &CancellationToken::new()).await;
        assert_eq!(results.len(), 2);
        let missing = results.iter().find(|r| r.model == "missing").unwrap();
        assert!(missing.result.as_ref().unwrap_err().is_not_found());
        let echo = results.iter().find(|r| r.model == "claude-echo").unwrap();
        assert_eq!(
            echo.result.as_ref().unwrap(),
            "[Anthropic] Response to: hi"
        );
    }
}

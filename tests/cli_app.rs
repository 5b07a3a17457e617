//! Tests that drive the `ai` application through whole commands.

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use termai::CollectingRenderer;
use termai::cli::{AiArgs, App, Command};

fn completion(content: &str) -> Value {
    json!({
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

async fn mock_endpoint(answer: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(answer)))
        .mount(&server)
        .await;
    server
}

fn args(home: &tempfile::TempDir) -> AiArgs {
    AiArgs {
        home: Some(home.path().to_str().unwrap().to_string()),
        no_stream: true,
        ..AiArgs::default()
    }
}

#[derive(Debug)]
struct Run {
    renderer: CollectingRenderer,
    out: String,
}

async fn run(app: &mut App, command: Command) -> termai::Result<Run> {
    let mut renderer = CollectingRenderer::default();
    let mut out = Vec::new();
    app.run(command, &CancellationToken::new(), &mut renderer, &mut out)
        .await?;
    Ok(Run {
        renderer,
        out: String::from_utf8(out).unwrap(),
    })
}

fn add(name: &str, url: &str) -> Command {
    Command::ModelAdd {
        name: name.to_string(),
        url: url.to_string(),
        api_key: "sk-abcdefghijkl".to_string(),
    }
}

fn ask(question: &str) -> Command {
    Command::Ask {
        question: question.to_string(),
    }
}

async fn sent_messages(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            body["messages"].clone()
        })
        .collect()
}

#[tokio::test]
async fn model_management() {
    let home = tempfile::tempdir().unwrap();
    let mut app = App::open(args(&home)).unwrap();

    let listing = run(&mut app, Command::ModelList).await.unwrap();
    assert!(listing.out.contains("No models configured"));

    let added = run(&mut app, add("gpt-a", "http://localhost:1")).await.unwrap();
    assert_eq!(added.out, "Model 'gpt-a' added successfully\n");
    run(&mut app, add("gpt-b", "http://localhost:2")).await.unwrap();
    assert_eq!(app.registry().default_name().as_deref(), Some("gpt-a"));

    let err = run(&mut app, add("gpt-a", "http://localhost:3"))
        .await
        .unwrap_err();
    assert!(err.is_already_exists());

    run(&mut app, Command::ModelSet("gpt-b".to_string()))
        .await
        .unwrap();
    let listing = run(&mut app, Command::ModelList).await.unwrap();
    let default_line = listing.out.lines().find(|l| l.contains('✓')).unwrap();
    assert!(default_line.contains("gpt-b"));
    assert!(!listing.out.contains("sk-abcdefghijkl"));

    // Everything above is on disk.
    let reopened = App::open(args(&home)).unwrap();
    assert_eq!(reopened.registry().len(), 2);
    assert_eq!(reopened.registry().default_name().as_deref(), Some("gpt-b"));

    run(&mut app, Command::ModelRemove("gpt-b".to_string()))
        .await
        .unwrap();
    assert_eq!(app.registry().default_name().as_deref(), Some("gpt-a"));
    let err = run(&mut app, Command::ModelRemove("gpt-b".to_string()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn model_options_update() {
    let home = tempfile::tempdir().unwrap();
    let mut app = App::open(args(&home)).unwrap();
    run(&mut app, add("gpt-a", "http://localhost:1")).await.unwrap();

    let mut app = App::open(AiArgs {
        temperature: Some("0.7".to_string()),
        max_tokens: Some(1000),
        ..args(&home)
    })
    .unwrap();
    let updated = run(&mut app, Command::ModelOptions("gpt-a".to_string()))
        .await
        .unwrap();
    assert!(updated.out.contains("Updated options for model 'gpt-a'"));
    assert!(
        updated
            .out
            .contains("Temperature: 0.70, MaxTokens: 1000, Stream: false, Default: true")
    );

    let config = app.registry().config("gpt-a").unwrap();
    let options = config.default_chat_options.unwrap();
    assert_eq!(options.temperature, 0.7);
    assert_eq!(options.max_tokens, 1000);
    assert!(!options.stream);
}

#[tokio::test]
async fn asking_records_the_conversation() {
    let server = mock_endpoint("an answer").await;
    let home = tempfile::tempdir().unwrap();
    let mut app = App::open(args(&home)).unwrap();
    run(&mut app, add("gpt-a", &server.uri())).await.unwrap();

    let first = run(&mut app, ask("first question")).await.unwrap();
    assert_eq!(first.renderer.text(), "an answer");
    assert_eq!(first.renderer.finished, 1);
    assert_eq!(app.sessions().messages().len(), 2);

    run(&mut app, ask("second question")).await.unwrap();
    assert_eq!(app.sessions().messages().len(), 4);

    let sent = sent_messages(&server).await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].as_array().unwrap().len(), 1);
    assert_eq!(
        sent[1],
        json!([
            {"role": "user", "content": "first question"},
            {"role": "assistant", "content": "an answer"},
            {"role": "user", "content": "second question"}
        ])
    );

    // The session survives a restart.
    let reopened = App::open(args(&home)).unwrap();
    assert_eq!(reopened.sessions().current_id(), app.sessions().current_id());
    assert_eq!(reopened.sessions().messages().len(), 4);
}

#[tokio::test]
async fn no_history_still_records() {
    let server = mock_endpoint("fresh").await;
    let home = tempfile::tempdir().unwrap();
    let mut app = App::open(args(&home)).unwrap();
    run(&mut app, add("gpt-a", &server.uri())).await.unwrap();
    run(&mut app, ask("one")).await.unwrap();

    let mut app = App::open(AiArgs {
        no_history: true,
        ..args(&home)
    })
    .unwrap();
    run(&mut app, ask("two")).await.unwrap();

    let sent = sent_messages(&server).await;
    assert_eq!(sent[1], json!([{"role": "user", "content": "two"}]));
    assert_eq!(app.sessions().messages().len(), 4);
}

#[tokio::test]
async fn asking_without_models() {
    let home = tempfile::tempdir().unwrap();
    let mut app = App::open(args(&home)).unwrap();
    let err = run(&mut app, ask("anyone?")).await.unwrap_err();
    assert!(err.is_validation());
    assert!(app.sessions().is_empty());
}

#[tokio::test]
async fn explicit_model_flag() {
    let server = mock_endpoint("from b").await;
    let home = tempfile::tempdir().unwrap();
    let mut app = App::open(args(&home)).unwrap();
    run(&mut app, add("gpt-a", "http://localhost:1")).await.unwrap();
    run(&mut app, add("gpt-b", &server.uri())).await.unwrap();

    let mut app = App::open(AiArgs {
        model: Some("gpt-b".to_string()),
        ..args(&home)
    })
    .unwrap();
    let answered = run(&mut app, ask("who?")).await.unwrap();
    assert_eq!(answered.renderer.text(), "from b");

    let mut app = App::open(AiArgs {
        model: Some("missing".to_string()),
        ..args(&home)
    })
    .unwrap();
    assert!(run(&mut app, ask("who?")).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn asking_about_a_file() {
    let server = mock_endpoint("it adds").await;
    let home = tempfile::tempdir().unwrap();
    let source = home.path().join("add.py");
    std::fs::write(&source, "def add(a, b):\n    return a + b\n").unwrap();

    let mut app = App::open(args(&home)).unwrap();
    run(&mut app, add("gpt-a", &server.uri())).await.unwrap();
    let source = source.to_str().unwrap().to_string();
    let answered = run(
        &mut app,
        Command::File {
            path: source.clone(),
            question: "What does this do?".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(answered.out.starts_with(&format!("File: {source} (Python)\n")));
    assert!(answered.out.contains("Question: What does this do?\n"));
    assert_eq!(answered.renderer.text(), "it adds");
    // File questions are not part of the conversation.
    assert!(app.sessions().is_empty());

    let sent = sent_messages(&server).await;
    let content = sent[0][0]["content"].as_str().unwrap();
    assert!(content.starts_with(&format!("file name: {source}\n\nfile content:\ndef add")));
    assert!(content.ends_with("\n\nquestion: What does this do?"));

    let err = run(
        &mut app,
        Command::File {
            path: home.path().join("image.png").to_str().unwrap().to_string(),
            question: "?".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn multi_model_question() {
    let server = mock_endpoint("shared answer").await;
    let home = tempfile::tempdir().unwrap();
    let mut app = App::open(args(&home)).unwrap();
    run(&mut app, add("gpt-a", &server.uri())).await.unwrap();
    run(&mut app, add("gpt-b", &server.uri())).await.unwrap();
    run(&mut app, add("claude-echo", "http://localhost:1"))
        .await
        .unwrap();

    let models = ["gpt-a", "gpt-b", "claude-echo", "missing"]
        .iter()
        .map(|m| m.to_string())
        .collect();
    let answered = run(
        &mut app,
        Command::Multi {
            models,
            question: "What is FP?".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(answered.out.starts_with("Question: What is FP?\n\n"));
    for model in ["gpt-a", "gpt-b", "claude-echo", "missing"] {
        assert!(answered.out.contains(&format!("===== Model: {model} =====\n")));
    }
    assert_eq!(answered.out.matches("shared answer").count(), 2);
    assert!(
        answered
            .out
            .contains("[Anthropic] Response to: What is FP?")
    );
    assert!(answered.out.contains("Error: model not found: missing"));
    assert!(answered.renderer.fragments.is_empty());
    assert!(app.sessions().is_empty());

    // Fan-out never streams.
    for request in server.received_requests().await.unwrap() {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert!(body.get("stream").is_none());
    }
}

#[tokio::test]
async fn session_management() {
    let server = mock_endpoint("ok").await;
    let home = tempfile::tempdir().unwrap();
    let mut app = App::open(args(&home)).unwrap();

    let listing = run(&mut app, Command::SessionList).await.unwrap();
    assert!(listing.out.contains("No history sessions found"));

    run(&mut app, add("gpt-a", &server.uri())).await.unwrap();
    run(&mut app, ask("about the first topic")).await.unwrap();
    let first = app.sessions().current_id().to_string();

    let started = run(&mut app, Command::NewSession).await.unwrap();
    assert_eq!(started.out, "Started a new session.\n");
    assert!(app.sessions().is_empty());
    run(&mut app, ask("about the second topic")).await.unwrap();
    let second = app.sessions().current_id().to_string();
    assert_ne!(first, second);

    let listing = run(&mut app, Command::SessionList).await.unwrap();
    assert!(listing.out.contains(&first));
    assert!(listing.out.contains(&second));
    assert!(listing.out.contains("about the first topic"));
    assert!(listing.out.contains("✓ indicates current session"));

    // The second session was updated last, so it is number 1.
    let switched = run(&mut app, Command::SessionSwitch("2".to_string()))
        .await
        .unwrap();
    assert_eq!(switched.out, format!("Switched to session: {first}\n"));
    assert_eq!(app.sessions().current_id(), first);

    let err = run(&mut app, Command::SessionDelete(first.clone()))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(
        run(&mut app, Command::SessionSwitch("9".to_string()))
            .await
            .unwrap_err()
            .is_validation()
    );

    let deleted = run(&mut app, Command::SessionDelete(second.clone()))
        .await
        .unwrap();
    assert_eq!(deleted.out, format!("Deleted session: {second}\n"));
    let err = run(&mut app, Command::SessionSwitch(second.clone()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let mut app = App::open(args(&home)).unwrap();
    let help = run(&mut app, Command::Help).await.unwrap();
    assert!(help.out.contains("ai multi <model1,model2,...> <question>"));
    assert!(help.out.contains("--no-history"));
}

//! Common test utilities and helpers for clawstat tests
//!
//! Builders here write real workspace trees into a temp directory, so the
//! integration tests exercise the same file-system paths as the binary.

#![allow(dead_code)]

use clawstat::data_loader::DataLoader;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Common test models used across tests
pub const TEST_MODELS: &[&str] = &["gpt-4o", "claude-sonnet-4", "qwen3-coder", "o3-mini"];

/// Rate used when a test does not care about cost
pub const TEST_RATE: f64 = 0.00001;

/// Builder for a single transcript message
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    model: Option<Value>,
    prompt_tokens: Option<Value>,
    completion_tokens: Option<Value>,
    usage: bool,
    null_usage: bool,
}

impl MessageBuilder {
    /// A message on `TEST_MODELS[0]` with 100 prompt and 50 completion tokens
    pub fn new() -> Self {
        Self {
            model: Some(json!(TEST_MODELS[0])),
            prompt_tokens: Some(json!(100)),
            completion_tokens: Some(json!(50)),
            usage: true,
            null_usage: false,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(json!(model));
        self
    }

    pub fn without_model(mut self) -> Self {
        self.model = None;
        self
    }

    pub fn with_null_model(mut self) -> Self {
        self.model = Some(Value::Null);
        self
    }

    pub fn with_tokens(mut self, prompt: u64, completion: u64) -> Self {
        self.prompt_tokens = Some(json!(prompt));
        self.completion_tokens = Some(json!(completion));
        self
    }

    pub fn with_raw_prompt_tokens(mut self, value: Value) -> Self {
        self.prompt_tokens = Some(value);
        self
    }

    pub fn without_completion_tokens(mut self) -> Self {
        self.completion_tokens = None;
        self
    }

    pub fn without_usage(mut self) -> Self {
        self.usage = false;
        self
    }

    pub fn with_null_usage(mut self) -> Self {
        self.null_usage = true;
        self
    }

    pub fn build(self) -> Value {
        let mut message = json!({ "role": "assistant", "content": "ok" });

        if let Some(model) = self.model {
            message["model"] = model;
        }

        if self.null_usage {
            message["usage"] = Value::Null;
        } else if self.usage {
            let mut usage = json!({});
            if let Some(prompt) = self.prompt_tokens {
                usage["prompt_tokens"] = prompt;
            }
            if let Some(completion) = self.completion_tokens {
                usage["completion_tokens"] = completion;
            }
            message["usage"] = usage;
        }

        message
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for an on-disk workspace
pub struct WorkspaceBuilder {
    dir: TempDir,
    with_sessions_dir: bool,
}

impl WorkspaceBuilder {
    /// A workspace with an empty `sessions/` directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            with_sessions_dir: true,
        }
    }

    /// A workspace root with no `sessions/` directory at all
    pub fn bare() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            with_sessions_dir: false,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.dir.path().join("sessions")
    }

    /// Add a session whose transcript holds `messages`
    pub fn session(self, id: &str, messages: Vec<MessageBuilder>) -> Self {
        let body = Value::Array(messages.into_iter().map(MessageBuilder::build).collect());
        self.raw_session(id, &body.to_string())
    }

    /// Add a session whose transcript holds `content` verbatim
    pub fn raw_session(self, id: &str, content: &str) -> Self {
        let dir = self.sessions_dir().join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("transcript.json"), content).unwrap();
        self
    }

    /// Add a session directory without a transcript
    pub fn empty_session(self, id: &str) -> Self {
        fs::create_dir_all(self.sessions_dir().join(id)).unwrap();
        self
    }

    /// Add a regular file directly under `sessions/`
    pub fn stray_file(self, name: &str) -> Self {
        fs::create_dir_all(self.sessions_dir()).unwrap();
        fs::write(self.sessions_dir().join(name), "not a session").unwrap();
        self
    }

    pub fn build(self) -> Workspace {
        if self.with_sessions_dir {
            fs::create_dir_all(self.sessions_dir()).unwrap();
        }
        Workspace { dir: self.dir }
    }
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A workspace on disk, removed when dropped
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn loader(&self) -> DataLoader {
        DataLoader::new(self.root()).expect("workspace root should be valid")
    }
}

/// Generate `sessions` sessions spread across the test models
pub fn generate_workspace(sessions: usize, messages_per_session: usize) -> Workspace {
    let mut builder = WorkspaceBuilder::new();
    for s in 0..sessions {
        let messages = (0..messages_per_session)
            .map(|m| {
                let msg = MessageBuilder::new()
                    .with_model(TEST_MODELS[(s + m) % TEST_MODELS.len()])
                    .with_tokens(100 + m as u64, 10 * s as u64);
                if m % 5 == 4 { msg.without_usage() } else { msg }
            })
            .collect();
        builder = builder.session(&format!("session-{s:04}"), messages);
    }
    builder.build()
}

/// Assert that two float values are approximately equal
pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
    assert!(
        (a - b).abs() <= tolerance,
        "Values are not approximately equal: {} != {} (tolerance: {})",
        a,
        b,
        tolerance
    );
}

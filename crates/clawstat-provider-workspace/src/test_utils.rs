//! Shared test utilities for unit tests

use once_cell::sync::Lazy;
use std::env;
use std::path::Path;

// Global mutex to serialize environment variable modifications in tests
pub static ENV_MUTEX: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

/// RAII guard for environment variable manipulation in tests
///
/// Restores every touched variable on drop, even if the test panics.
pub struct EnvVarGuard {
    vars: Vec<(String, Option<String>)>,
}

impl EnvVarGuard {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set an environment variable and save its original value for restoration
    pub fn set(&mut self, key: &str, value: &str) {
        let original = env::var(key).ok();
        self.vars.push((key.to_string(), original));
        // env::set_var is unsafe since Rust 2024; callers hold ENV_MUTEX
        unsafe {
            env::set_var(key, value);
        }
    }

    /// Remove an environment variable and save its original value for restoration
    pub fn remove(&mut self, key: &str) {
        let original = env::var(key).ok();
        self.vars.push((key.to_string(), original));
        unsafe {
            env::remove_var(key);
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.vars.iter().rev() {
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

impl Default for EnvVarGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `sessions/<session>/transcript.json` under `root`
pub fn write_transcript(root: &Path, session: &str, content: &str) {
    let dir = root.join("sessions").join(session);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("transcript.json"), content).unwrap();
}

/// A transcript message JSON object with usage and an optional model
pub fn usage_message(model: Option<&str>, prompt: u64, completion: u64) -> String {
    match model {
        Some(model) => format!(
            r#"{{"role":"assistant","model":"{model}","usage":{{"prompt_tokens":{prompt},"completion_tokens":{completion}}}}}"#
        ),
        None => format!(
            r#"{{"role":"assistant","usage":{{"prompt_tokens":{prompt},"completion_tokens":{completion}}}}}"#
        ),
    }
}

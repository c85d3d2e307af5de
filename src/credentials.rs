//! Login credentials.
//!
//! Credentials are never stored; they are read from the terminal for each
//! run and kept in `SecretString`s so they stay out of logs and debug output.

use secrecy::SecretString;

/// Environment variable that makes the prompts echo input, for debugging.
pub const ECHO_INPUT_ENV: &str = "M2U_ECHO_INPUT";

pub struct Credentials {
    pub username: SecretString,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: SecretString::from(username.into()),
            password: SecretString::from(password.into()),
        }
    }

    /// Prompt for username and password on the terminal.
    ///
    /// Input is hidden unless [`ECHO_INPUT_ENV`] is set to a truthy value.
    #[cfg(feature = "cli")]
    pub fn prompt() -> anyhow::Result<Self> {
        use anyhow::Context;
        use dialoguer::{Input, Password};

        let echo = echo_enabled(std::env::var(ECHO_INPUT_ENV).ok().as_deref());
        let read = |prompt: &str| -> anyhow::Result<String> {
            let value = if echo {
                Input::<String>::new().with_prompt(prompt).interact_text()
            } else {
                Password::new().with_prompt(prompt).interact()
            };
            value.with_context(|| format!("Failed to read {}", prompt.to_lowercase()))
        };

        let username = read("Username")?;
        let password = read("Password")?;
        Ok(Self::new(username.trim(), password))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

#[cfg_attr(not(feature = "cli"), allow(dead_code))]
fn echo_enabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"),
    }
}

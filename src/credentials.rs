//! Login credentials shared by every device session in a run.

use std::fmt;

use zeroize::Zeroizing;

use crate::prompt::{PromptError, Prompter};

/// Notice shown when the two password entries differ.
pub const PASSWORD_MISMATCH: &str = "Passwords did not match, please try again;\n";

/// Username and password for password authentication.
///
/// Lives only in process memory. The password buffer is wiped on drop and
/// never appears in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Creates credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// The login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password. Callers must not log it.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Collects credentials from the operator.
///
/// Asks for the username unless one is already known, then asks for the
/// password twice until both entries match.
pub fn collect_credentials<P: Prompter + ?Sized>(
    prompter: &mut P,
    username: Option<&str>,
) -> Result<Credentials, PromptError> {
    let username = match username {
        Some(name) => name.to_string(),
        None => prompter.ask("Provide username: ")?,
    };

    loop {
        let first = Zeroizing::new(prompter.ask_secret(&format!("Password for {}: ", username))?);
        let second = Zeroizing::new(
            prompter.ask_secret(&format!("Retype password for {}: ", username))?,
        );
        if *first == *second {
            return Ok(Credentials::new(username, first.as_str()));
        }
        prompter.notify(PASSWORD_MISMATCH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("admin", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}

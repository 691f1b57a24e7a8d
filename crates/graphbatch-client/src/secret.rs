//! Secret references.
//!
//! Credential values from any configuration layer can point elsewhere
//! instead of holding the secret itself:
//!
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - `env::VAR_NAME`: value of `$VAR_NAME`
//! - anything else: used verbatim

use std::process::Command;

/// A configuration value, classified by prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    /// Entry in the `pass` password store.
    Pass(&'a str),
    /// Environment variable name.
    Env(&'a str),
    /// Literal value.
    Plain(&'a str),
}

impl<'a> SecretRef<'a> {
    /// Classifies `value`.
    pub fn parse(value: &'a str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else {
            Self::Plain(value)
        }
    }

    /// Returns true unless the value is a literal.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Plain(_))
    }

    /// Produces the secret value.
    pub fn resolve(&self) -> Result<String, String> {
        match *self {
            Self::Pass(path) => pass_show(path),
            Self::Env(var) => match std::env::var(var) {
                Ok(value) if !value.is_empty() => Ok(value),
                Ok(_) => Err(format!("environment variable `{}` is empty", var)),
                Err(_) => Err(format!("environment variable `{}` is not set", var)),
            },
            Self::Plain(value) => Ok(value.to_string()),
        }
    }
}

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, String> {
    SecretRef::parse(value).resolve()
}

fn pass_show(path: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", path])
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_prefixes() {
        assert_eq!(SecretRef::parse("pass::azure/app"), SecretRef::Pass("azure/app"));
        assert_eq!(SecretRef::parse("env::GRAPH_SECRET"), SecretRef::Env("GRAPH_SECRET"));
        assert_eq!(SecretRef::parse("abc~123"), SecretRef::Plain("abc~123"));
        assert!(SecretRef::parse("env::X").is_reference());
        assert!(!SecretRef::parse("plain").is_reference());
    }

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("").unwrap(), "");
        assert_eq!(
            resolve("11111111-2222-3333-4444-555555555555").unwrap(),
            "11111111-2222-3333-4444-555555555555"
        );
    }

    #[test]
    fn env_reference_resolves() {
        unsafe {
            std::env::set_var("_GRAPHBATCH_TEST_SECRET", "my-secret-value");
        }
        assert_eq!(resolve("env::_GRAPHBATCH_TEST_SECRET").unwrap(), "my-secret-value");
        unsafe {
            std::env::remove_var("_GRAPHBATCH_TEST_SECRET");
        }
    }

    #[test]
    fn env_reference_unset_or_empty_errors() {
        let err = resolve("env::_GRAPHBATCH_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(err.contains("not set"));

        unsafe {
            std::env::set_var("_GRAPHBATCH_TEST_EMPTY", "");
        }
        let err = resolve("env::_GRAPHBATCH_TEST_EMPTY").unwrap_err();
        assert!(err.contains("empty"));
        unsafe {
            std::env::remove_var("_GRAPHBATCH_TEST_EMPTY");
        }
    }

    #[test]
    fn pass_reference_to_missing_entry_errors() {
        // Fails either on the missing binary or on the missing entry.
        assert!(resolve("pass::nonexistent/entry/that/should/not/exist/12345").is_err());
    }
}

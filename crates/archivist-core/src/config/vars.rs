//! Environment variable interpolation for config files.
//!
//! Supports the following syntax:
//! - `$VAR` or `${VAR}` - substitute with the variable's value, error if missing
//! - `${VAR:-default}` - use default if VAR is unset OR empty
//! - `${VAR-default}` - use default only if VAR is unset (empty is OK)
//! - `$$` - escape sequence for literal `$`

use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \$\$                           # escape
        |
        \$\{
            ([A-Za-z_][A-Za-z0-9_]*)   # 1: braced name
            (?:
                (:?-)                  # 2: default operator
                ([^}]*)                # 3: default value
            )?
        \}
        |
        \$([A-Za-z_][A-Za-z0-9_]*)     # 4: bare name
        ",
    )
    .expect("Invalid regex pattern")
});

/// Result of environment variable interpolation.
#[derive(Debug)]
pub struct InterpolationResult {
    /// The interpolated text.
    pub text: String,
    /// Every problem found, so all missing variables are reported at once.
    pub errors: Vec<String>,
}

impl InterpolationResult {
    /// Returns true if there were no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Interpolate process environment variables in the given text.
pub fn interpolate(input: &str) -> InterpolationResult {
    interpolate_with(input, |name| env::var(name).ok())
}

/// Interpolate variables resolved through `lookup`.
///
/// Unresolvable references are left in place and reported in
/// [`InterpolationResult::errors`].
pub fn interpolate_with<F>(input: &str, lookup: F) -> InterpolationResult
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    let text = ENV_VAR_PATTERN
        .replace_all(input, |caps: &Captures| {
            let full_match = &caps[0];
            if full_match == "$$" {
                return "$".to_string();
            }

            let name = caps
                .get(1)
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let operator = caps.get(2).map(|m| m.as_str());
            let default = caps.get(3).map(|m| m.as_str());

            match lookup(name) {
                Some(value) if value.contains(['\n', '\r']) => {
                    errors.push(format!(
                        "environment variable '{name}' contains newlines, which is not allowed"
                    ));
                    full_match.to_string()
                }
                Some(value) if value.is_empty() && operator == Some(":-") => {
                    default.unwrap_or_default().to_string()
                }
                Some(value) => value,
                None => match default {
                    Some(default) => default.to_string(),
                    None => {
                        errors.push(format!("environment variable '{name}' is not set"));
                        full_match.to_string()
                    }
                },
            }
        })
        .into_owned();

    InterpolationResult { text, errors }
}

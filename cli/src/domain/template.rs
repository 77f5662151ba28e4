//! Placeholder substitution for embedded templates.

use std::collections::HashMap;

/// Replace every `{{name}}` in `template` with its value from `vars`.
///
/// Placeholders without a value are left untouched.
#[must_use]
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

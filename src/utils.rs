use std::path::PathBuf;

use crate::constants::HOME_PLACEHOLDER;

/// Expand a leading `~` to the home directory and make the path absolute.
///
/// Relative paths are resolved against the current working directory. If the
/// home directory cannot be determined the `~` is left untouched.
pub fn resolve_user_path(raw: &str) -> PathBuf {
    let expanded = expand_home(raw);
    std::path::absolute(&expanded).unwrap_or(expanded)
}

fn expand_home(raw: &str) -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return PathBuf::from(raw);
    };

    if raw == HOME_PLACEHOLDER {
        return home;
    }

    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

/// Replace every `~` in a node argument with the home directory.
pub fn substitute_home(argument: &str) -> String {
    match dirs::home_dir() {
        Some(home) => argument.replace(HOME_PLACEHOLDER, &home.to_string_lossy()),
        None => argument.to_string(),
    }
}

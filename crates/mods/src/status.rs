//! Enabled/disabled naming of mod folders
//!
//! A mod is disabled by prefixing its folder name (default `DISABLED `).
//! Detection is case-insensitive so folders renamed by hand still count,
//! and `disabled ` is always recognized even when another prefix is set.

const DISABLED_WORD: &str = "disabled ";

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &name[prefix.len()..])
}

fn enabled_name<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    strip_prefix_ignore_case(name, prefix)
        .or_else(|| strip_prefix_ignore_case(name, DISABLED_WORD))
}

/// Whether `name` carries a disabled prefix
pub fn is_disabled(name: &str, prefix: &str) -> bool {
    enabled_name(name, prefix).is_some()
}

/// Folder name after toggling the enabled state
pub fn toggled_name(name: &str, prefix: &str) -> String {
    match enabled_name(name, prefix) {
        Some(stripped) => stripped.to_string(),
        None => format!("{prefix}{name}"),
    }
}

//! Display name validation matching backend constraints.

/// Minimum allowed length for a display name.
pub const DISPLAY_NAME_MIN: usize = 3;
/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 32;

/// Whether a display name satisfies the backend's constraints: length
/// between [`DISPLAY_NAME_MIN`] and [`DISPLAY_NAME_MAX`] with only letters,
/// digits, spaces, or underscores.
pub fn is_valid_display_name(name: &str) -> bool {
    let length = name.chars().count();
    if length < DISPLAY_NAME_MIN || length > DISPLAY_NAME_MAX {
        return false;
    }
    if name.trim().is_empty() {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_')
}

/// Reduce an arbitrary name to the allowed character set, or `None` when
/// nothing valid remains.
pub(crate) fn sanitise_display_name(raw: &str) -> Option<String> {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    let clamped: String = collapsed.chars().take(DISPLAY_NAME_MAX).collect();
    let trimmed = clamped.trim().to_owned();
    is_valid_display_name(&trimmed).then_some(trimmed)
}

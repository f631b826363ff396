//! Canonical naming for per-user resources.
//!
//! Provider resource names are derived from a template name and the owning
//! user's name. Both instance and network names go through [`qualify`] so the
//! attachment planner can join either kind with the same lookup.

const SEPARATOR: char = '-';

/// Replaces every `.` and `_` in `raw` with `-`.
///
/// Case is preserved. The mapping is idempotent: normalising an already
/// normalised name returns it unchanged.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|ch| if matches!(ch, '.' | '_') { SEPARATOR } else { ch })
        .collect()
}

/// Builds the canonical name for `template_name` owned by `owner`.
#[must_use]
pub fn qualify(template_name: &str, owner: &str) -> String {
    normalize(&format!("{template_name}_{owner}"))
}

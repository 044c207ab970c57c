use crate::error::BackendError;

pub const MAX_SHEET_NAME_LEN: usize = 31;

const ILLEGAL_SHEET_CHARS: [char; 7] = [':', '\\', '*', '?', '/', '[', ']'];

/// Validate a sheet name against the container naming rules: non-blank,
/// at most [`MAX_SHEET_NAME_LEN`] characters, no control characters, none
/// of `: \ * ? / [ ]`, and no leading or trailing single quote.
///
/// Collision with an existing sheet is checked by the backend, which is
/// the only party that knows its own sheet table.
pub fn validate_sheet_name(name: &str) -> Result<(), BackendError> {
    let reject = |reason: &str| {
        Err(BackendError::SheetName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.trim().is_empty() {
        return reject("sheet name cannot be empty or blank");
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return reject("sheet name cannot be longer than 31 characters");
    }
    if name
        .chars()
        .any(|c| c.is_control() || ILLEGAL_SHEET_CHARS.contains(&c))
    {
        return reject("sheet name contains illegal characters");
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return reject("sheet name cannot start or end with a single quote");
    }
    Ok(())
}

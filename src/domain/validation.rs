//! Local pre-checks mirrored from the backend's rules.
//!
//! Every check here runs before a request is issued so that an obviously
//! invalid action never reaches the network.

use super::errors::{DomainError, DomainResult};
use super::models::HorseIdentity;

/// Earliest accepted birth year.
pub const MIN_HORSE_YEAR: i32 = 1990;

/// Largest file the backend stores, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;

const FORBIDDEN_EXTENSIONS: [&str; 7] = ["exe", "bat", "cmd", "sh", "js", "jar", "py"];

/// Parses the year field. Whitespace around the number is ignored.
pub fn parse_year(text: &str) -> Option<i32> {
    text.trim().parse::<i32>().ok()
}

/// Checks the name and year rules that gate submission.
pub fn check_identity_fields(identity: &HorseIdentity, current_year: i32) -> DomainResult<()> {
    if identity.ru().is_none() && identity.en().is_none() {
        return Err(DomainError::MissingName);
    }
    match identity.year {
        Some(year) if (MIN_HORSE_YEAR..=current_year).contains(&year) => Ok(()),
        _ => Err(DomainError::InvalidYear {
            min: MIN_HORSE_YEAR,
            max: current_year,
        }),
    }
}

/// Full identity validation used before creating an application.
///
/// On top of [`check_identity_fields`] this applies the backend's script
/// rules: the Russian name is Cyrillic letters only, the English name is
/// ASCII Latin letters only.
pub fn validate_identity(identity: &HorseIdentity, current_year: i32) -> DomainResult<()> {
    check_identity_fields(identity, current_year)?;
    if let Some(ru) = identity.ru() {
        if !ru.chars().all(is_cyrillic_letter) {
            return Err(DomainError::InvalidRussianName);
        }
    }
    if let Some(en) = identity.en() {
        if !en.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidEnglishName);
        }
    }
    Ok(())
}

fn is_cyrillic_letter(c: char) -> bool {
    ('А'..='я').contains(&c) || c == 'Ё' || c == 'ё'
}

/// Rejects forbidden extensions and oversized files.
pub fn validate_upload(file_name: &str, size_bytes: u64) -> DomainResult<()> {
    let lowered = file_name.to_ascii_lowercase();
    let forbidden = FORBIDDEN_EXTENSIONS.iter().any(|ext| {
        lowered
            .strip_suffix(*ext)
            .is_some_and(|stem| stem.ends_with('.'))
    });
    if forbidden {
        return Err(DomainError::ForbiddenExtension(file_name.to_string()));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(DomainError::FileTooLarge(file_name.to_string()));
    }
    Ok(())
}

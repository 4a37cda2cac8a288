use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-ZÀ-ÿ\s'-]+$").expect("valid name regex"));

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

pub const MAX_COMMENT_CHARS: usize = 1000;

fn char_len_between(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}

pub fn email(value: &str) -> Result<String, AppError> {
    let value = value.trim().to_lowercase();
    if EMAIL_RE.is_match(&value) {
        Ok(value)
    } else {
        Err(AppError::validation("invalid email address"))
    }
}

pub fn person_name(value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if !char_len_between(value, 2, 100) {
        return Err(AppError::validation("name must be between 2 and 100 characters"));
    }
    if !NAME_RE.is_match(value) {
        return Err(AppError::validation(
            "name may only contain letters, spaces, hyphens and apostrophes",
        ));
    }
    Ok(value.to_string())
}

pub fn password(value: &str) -> Result<(), AppError> {
    if !char_len_between(value, 8, 128) {
        return Err(AppError::validation("password must be between 8 and 128 characters"));
    }
    let has_letter = value.chars().any(char::is_alphabetic);
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(AppError::validation(
            "password must contain at least one letter and one number",
        ));
    }
    Ok(())
}

pub fn display_name(value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if !char_len_between(value, 2, 50) {
        return Err(AppError::validation("display name must be between 2 and 50 characters"));
    }
    Ok(value.to_string())
}

/// Strips markup from a review comment and enforces the length limit.
pub fn review_comment(value: &str) -> Result<String, AppError> {
    let clean = TAG_RE.replace_all(value, "");
    let clean = clean.trim();
    if clean.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::validation("comment must be at most 1000 characters"));
    }
    Ok(clean.to_string())
}

/// Trimmed text whose length in characters lies within `min..=max`.
pub fn bounded_text(field: &str, value: &str, min: usize, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if char_len_between(value, min, max) {
        Ok(value.to_string())
    } else {
        Err(AppError::validation(format!(
            "{field} must be between {min} and {max} characters"
        )))
    }
}

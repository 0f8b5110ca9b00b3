//! Chirp body rules: a byte-length cap and a small profanity filter.

use crate::error::ValidationError;

/// Maximum chirp length in bytes
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const REPLACEMENT: &str = "****";

/// Checks the length limit and returns the cleaned body
pub fn validate_chirp_body(body: &str) -> Result<String, ValidationError> {
    if body.len() > MAX_CHIRP_LENGTH {
        return Err(ValidationError::ChirpTooLong);
    }

    Ok(clean_profanity(body))
}

/// Replaces whole whitespace-separated words matching the list
/// (case-insensitively) and rejoins with single spaces.
pub fn clean_profanity(body: &str) -> String {
    body.split_whitespace()
        .map(|word| {
            let lowered = word.to_lowercase();
            if PROFANE_WORDS.contains(&lowered.as_str()) {
                REPLACEMENT
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

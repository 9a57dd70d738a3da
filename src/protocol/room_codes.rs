//! Lobby and signaling room code generation.

use rand::Rng;

/// Draws `length` characters uniformly from `alphabet`.
///
/// # Panics
/// Panics if `alphabet` is empty.
#[must_use]
pub fn generate_code(alphabet: &str, length: usize) -> String {
    let chars: Vec<char> = alphabet.chars().collect();
    assert!(!chars.is_empty(), "room code alphabet must not be empty");

    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..chars.len());
            // SAFETY: `idx` is drawn from `0..chars.len()`, always in bounds.
            #[allow(clippy::indexing_slicing)]
            chars[idx]
        })
        .collect()
}

/// Draws a code and retries while `taken` reports a collision against either
/// the lobby or the signaling room code namespace.
pub fn generate_unique_code(
    alphabet: &str,
    length: usize,
    mut taken: impl FnMut(&str) -> bool,
) -> String {
    loop {
        let candidate = generate_code(alphabet, length);
        if !taken(&candidate) {
            return candidate;
        }
    }
}

/// Fixed code returned in debug mode, overriding collision checks.
pub const DEBUG_CODE: &str = "TEST";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    #[test]
    fn generates_codes_of_requested_length() {
        let code = generate_code(ALPHABET, 4);
        assert_eq!(code.chars().count(), 4);
        assert!(code.chars().all(|c| ALPHABET.contains(c)));
    }

    #[test]
    fn unique_code_retries_past_collisions() {
        let mut calls = 0;
        let code = generate_unique_code(ALPHABET, 4, |_| {
            calls += 1;
            calls < 3
        });
        assert_eq!(code.chars().count(), 4);
        assert_eq!(calls, 3);
    }

    #[test]
    fn codes_are_not_trivially_repeated() {
        let codes: HashSet<String> = (0..50).map(|_| generate_code(ALPHABET, 4)).collect();
        assert!(codes.len() > 1, "expected some variation across draws");
    }
}

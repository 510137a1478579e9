//! Keyed polyalphabetic substitution cipher (innermost message layer).
//!
//! Each ASCII letter of the input is shifted by an amount taken from a
//! schedule derived from the key, cycling the schedule over the letters.
//! Everything that is not an ASCII letter passes through unchanged, so
//! arbitrary UTF-8 text round-trips.
//!
//! The cipher itself is pure and total: a key with an empty shift schedule
//! makes the transform the identity. The pipeline substitutes the default
//! key before this layer is invoked, so an empty key never reaches it in
//! practice.

const ALPHABET_LEN: u8 = 26;

/// Shift schedule for a key: one shift value per key byte.
fn shift_schedule(key: &str) -> Vec<u8> {
    key.bytes().map(|b| b % ALPHABET_LEN).collect()
}

fn shift_char(c: char, shift: u8, forward: bool) -> char {
    let base = if c.is_ascii_uppercase() { b'A' } else { b'a' };
    let pos = c as u8 - base;
    let moved = if forward {
        (pos + shift) % ALPHABET_LEN
    } else {
        (pos + ALPHABET_LEN - shift) % ALPHABET_LEN
    };
    (base + moved) as char
}

fn transform(text: &str, key: &str, forward: bool) -> String {
    let schedule = shift_schedule(key);
    if schedule.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut key_idx = 0usize;

    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            out.push(shift_char(c, schedule[key_idx % schedule.len()], forward));
            // The key advances only on shifted characters so that
            // punctuation and whitespace do not desynchronize the two ends.
            key_idx += 1;
        } else {
            out.push(c);
        }
    }

    out
}

/// Encodes `plaintext` with the given key.
pub fn encode(plaintext: &str, key: &str) -> String {
    transform(plaintext, key, true)
}

/// Decodes `ciphertext` with the given key.
///
/// `decode(encode(x, k), k) == x` for all inputs and keys.
pub fn decode(ciphertext: &str, key: &str) -> String {
    transform(ciphertext, key, false)
}

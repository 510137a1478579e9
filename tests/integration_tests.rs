//! Integration tests for MistChat
//!
//! The receive path never hard-fails past the session layer: a wrong
//! per-message key produces degraded (garbled) text, not an error. Only a
//! wrong session password or a tampered envelope raises.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};

use mistchat::chat::{chat_id, derive_session_password};
use mistchat::crypto::{vault_open, vault_seal, vigenere, whitemist};
use mistchat::{
    decrypt_file, decrypt_text, encrypt_file, encrypt_text, stego, FileCipher, PipelineError,
    SessionCipher, SessionCipherError, TextDecryption,
};

fn carrier_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 13) % 256) as u8,
            ((y * 29) % 256) as u8,
            (((x * y) + 7) % 256) as u8,
        ])
    });
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

/// Full three-layer round trip.
#[test]
fn test_pipeline_roundtrip() {
    let session = SessionCipher::new("session pw");
    let envelope = encrypt_text("hello world", "key1", &session).unwrap();

    let result = decrypt_text(&envelope, "key1", &session).unwrap();
    assert_eq!(result, TextDecryption::Clean("hello world".to_string()));
}

/// Two sends of the same text never produce the same envelope.
#[test]
fn test_envelopes_are_fresh() {
    let session = SessionCipher::new("session pw");
    let a = encrypt_text("same text", "k", &session).unwrap();
    let b = encrypt_text("same text", "k", &session).unwrap();
    assert_ne!(a, b);

    // Salt and nonce differ, not just the ciphertext.
    let raw_a = BASE64.decode(&a).unwrap();
    let raw_b = BASE64.decode(&b).unwrap();
    assert_ne!(&raw_a[..28], &raw_b[..28]);
}

/// Wrong per-message key: a string comes back, nothing raises, and it is
/// not the plaintext.
#[test]
fn test_wrong_message_key_degrades_not_raises() {
    let session = SessionCipher::new("session pw");
    let envelope = encrypt_text(
        "secret content that must not survive a wrong key intact",
        "right",
        &session,
    )
    .unwrap();

    let result = decrypt_text(&envelope, "wrong", &session).unwrap();
    assert_ne!(
        result.text(),
        "secret content that must not survive a wrong key intact"
    );
}

/// Wrong session password is the one hard failure.
#[test]
fn test_wrong_session_password_raises() {
    let envelope = encrypt_text("secret", "k", &SessionCipher::new("right pw")).unwrap();
    let result = decrypt_text(&envelope, "k", &SessionCipher::new("wrong pw"));

    assert!(matches!(
        result,
        Err(PipelineError::Session(SessionCipherError::AuthenticationFailed))
    ));
}

/// A tampered envelope is indistinguishable from a wrong password: hard
/// authentication failure, never partial plaintext.
#[test]
fn test_tampered_envelope_raises() {
    let session = SessionCipher::new("pw");
    let envelope = encrypt_text("payload", "k", &session).unwrap();

    let mut raw = BASE64.decode(&envelope).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x80;
    let tampered = BASE64.encode(raw);

    assert!(decrypt_text(&tampered, "k", &session).is_err());
}

/// A payload that never went through the second layer decrypts as
/// degraded: the substitution decode still runs and the flag is set.
#[test]
fn test_legacy_payload_is_degraded_but_readable() {
    let session = SessionCipher::new("pw");
    let inner = vigenere::encode("pesan generasi pertama!", "kunci");
    let envelope = session.encrypt(inner.as_bytes()).unwrap();

    let result = decrypt_text(&envelope, "kunci", &session).unwrap();
    assert!(result.is_degraded());
    assert_eq!(result.text(), "pesan generasi pertama!");
}

/// The empty key and the spelled-out default key are the same key.
#[test]
fn test_default_key_guard() {
    let session = SessionCipher::new("pw");
    let envelope = encrypt_text("text", "", &session).unwrap();
    let result = decrypt_text(&envelope, mistchat::DEFAULT_LAYER_KEY, &session).unwrap();
    assert_eq!(result.into_text(), "text");
}

/// Layer 2 alone: both framings round-trip, and the binary path recovers
/// legacy text payloads instead of failing the base64 unwrap.
#[test]
fn test_whitemist_framing_contract() {
    let text_ct = whitemist::encrypt_payload("chat text".as_bytes(), "k", true).unwrap();
    assert_eq!(
        whitemist::decrypt_payload(&text_ct, "k", true).unwrap(),
        b"chat text"
    );

    let blob: Vec<u8> = (0u16..300).map(|i| (i % 256) as u8).collect();
    let file_ct = whitemist::encrypt_payload(&blob, "k", false).unwrap();
    assert_eq!(whitemist::decrypt_payload(&file_ct, "k", false).unwrap(), blob);

    let legacy_ct = whitemist::encrypt_payload("bukan base64, pesan lama".as_bytes(), "k", true)
        .unwrap();
    assert_eq!(
        whitemist::decrypt_payload(&legacy_ct, "k", false).unwrap(),
        b"bukan base64, pesan lama"
    );
}

/// File pipeline: each method round-trips with its own inverse.
#[test]
fn test_file_pipeline_roundtrips() {
    let data: Vec<u8> = (0u32..4096).map(|i| (i * 31 % 256) as u8).collect();

    for method in [FileCipher::Aes, FileCipher::Whitemist] {
        let encrypted = encrypt_file(&data, "file pw", method).unwrap();
        assert_ne!(encrypted, data);
        assert_eq!(decrypt_file(&encrypted, "file pw", method).unwrap(), data);
    }
}

/// The two file ciphers are not interchangeable.
#[test]
fn test_file_methods_mutually_exclusive() {
    let data: Vec<u8> = (0u32..2048).map(|i| (i * 17 % 256) as u8).collect();

    let aes = encrypt_file(&data, "pw", FileCipher::Aes).unwrap();
    match decrypt_file(&aes, "pw", FileCipher::Whitemist) {
        Err(_) => {}
        Ok(bytes) => assert_ne!(bytes, data),
    }

    let wm = encrypt_file(&data, "pw", FileCipher::Whitemist).unwrap();
    assert!(decrypt_file(&wm, "pw", FileCipher::Aes).is_err());
}

/// Image hide/reveal round trip, and the wrong key garbles without error.
#[test]
fn test_stego_roundtrip() {
    let carrier = carrier_png(120, 90);

    let png = stego::hide(&carrier, "hidden msg", "k").unwrap();
    assert_eq!(stego::reveal(&png, "k").unwrap(), "hidden msg");

    let garbled = stego::reveal(&png, "not-k").unwrap();
    assert_ne!(garbled, "hidden msg");
}

/// Oversized secrets are rejected before anything is produced.
#[test]
fn test_stego_capacity_exceeded() {
    let carrier = carrier_png(10, 10);
    let result = stego::hide(&carrier, &"a".repeat(500), "k");
    assert!(matches!(result, Err(stego::StegoError::CapacityExceeded { .. })));
}

/// Config vault: seal/open round trip and both failure modes.
#[test]
fn test_vault_contract() {
    let sealed = vault_seal("[\"usb-token-1\"]", "master pw").unwrap();

    // Record is the documented JSON-with-hex shape.
    let record: serde_json::Value = serde_json::from_slice(&sealed).unwrap();
    for field in ["salt", "nonce", "tag", "ciphertext"] {
        assert!(record.get(field).and_then(|v| v.as_str()).is_some());
    }

    assert_eq!(vault_open(&sealed, "master pw").unwrap(), "[\"usb-token-1\"]");
    assert!(vault_open(&sealed, "other pw").is_err());
}

/// Session identifiers are order-independent and deterministic.
#[test]
fn test_session_derivation() {
    assert_eq!(chat_id("niko", "ami"), chat_id("ami", "niko"));
    assert_eq!(
        derive_session_password("niko", "ami"),
        derive_session_password("ami", "niko")
    );

    // Both ends derive compatible ciphers from usernames alone.
    let password = derive_session_password("ami", "niko");
    let sender = SessionCipher::new(&password);
    let receiver = SessionCipher::new(&derive_session_password("niko", "ami"));

    let envelope = encrypt_text("halo", "k", &sender).unwrap();
    let result = decrypt_text(&envelope, "k", &receiver).unwrap();
    assert_eq!(result.into_text(), "halo");
}

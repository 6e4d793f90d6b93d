//! # vocalis-storage
//!
//! Encryption at rest for stored artifacts (uploaded and generated audio).
//! Keys are derived from a master secret and a persisted salt; payloads are
//! sealed with ChaCha20-Poly1305.

pub mod cipher;
pub mod salt;

pub use cipher::FileCipher;
pub use salt::load_or_create_salt;

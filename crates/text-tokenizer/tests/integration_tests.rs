//! Integration tests for text-tokenizer crate.
//!
//! These tests verify tokenization with a real tokenizer file and the
//! sentence splitter on voice descriptions.

use std::path::PathBuf;
use text_tokenizer::{SentenceSplitter, Tokenizer, split_sentences};
use tts_core::{Lang, TextTokenizer};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture() -> Tokenizer {
    Tokenizer::from_file(fixture_path("test_tokenizer.json")).expect("should load tokenizer")
}

#[test]
fn test_load_tokenizer_from_file() {
    let tokenizer = load_fixture();

    let ids = tokenizer.encode("speaks slowly").expect("should encode");
    assert_eq!(ids, vec![11, 12, 1]);
}

#[test]
fn test_load_missing_file() {
    let err = Tokenizer::from_file(fixture_path("missing.json")).unwrap_err();
    assert!(matches!(err, tts_core::TtsError::ModelLoad { .. }));
}

#[test]
fn test_encode_appends_eos() {
    let tokenizer = load_fixture();

    let ids = tokenizer.encode("A calm female voice.").expect("should encode");
    assert_eq!(ids, vec![5, 6, 7, 8, 9, 1]);
}

#[test]
fn test_encode_unknown_words() {
    let tokenizer = load_fixture();

    let ids = tokenizer.encode("hello martian").expect("should encode");
    assert_eq!(ids, vec![3, 2, 1]);
}

#[test]
fn test_encode_applies_lowercase_normalizer() {
    let tokenizer = load_fixture();

    let ids = tokenizer.encode("Hello WORLD").expect("should encode");
    assert_eq!(ids, vec![3, 4, 1]);
}

#[test]
fn test_from_bytes_matches_from_file() {
    let json = std::fs::read(fixture_path("test_tokenizer.json")).unwrap();
    let from_bytes = Tokenizer::from_bytes(json).expect("should parse");
    let from_file = load_fixture();

    assert_eq!(
        from_bytes.encode("calm voice").unwrap(),
        from_file.encode("calm voice").unwrap()
    );
}

#[test]
fn test_split_then_encode_each_sentence() {
    let tokenizer = load_fixture();

    let sentences = split_sentences("A calm voice. A female voice speaks slowly.");
    assert_eq!(sentences.len(), 2);

    let encoded: Vec<Vec<u32>> = sentences
        .iter()
        .map(|s| tokenizer.encode(s).unwrap())
        .collect();
    assert_eq!(encoded[0], vec![5, 6, 8, 9, 1]);
    assert_eq!(encoded[1], vec![5, 7, 8, 11, 12, 9, 1]);
}

#[test]
fn test_splitter_preserves_order_and_content() {
    let description = "Jon's voice is monotone. He speaks fast! Is the recording clear? Very.";
    let sentences = SentenceSplitter::new(Lang::En).split(description);

    assert_eq!(sentences.len(), 4);
    assert_eq!(sentences.join(" "), description);
}

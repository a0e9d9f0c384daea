//! Credential loading from PEM files on disk.

use std::error::Error as _;

use semaas_core::{DecodeError, Error, FormatProblem, PemCredential, PemField};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn loads_rsa_pair_from_files() {
    let credential = PemCredential::from_files(fixture("client.crt"), fixture("client.key")).unwrap();
    assert!(credential.subject().contains("semaas-test-client"));

    let store = credential.key_store();
    let [cert_alias, key_alias] = store.aliases();
    assert!(store.certificate(cert_alias).is_some());
    assert!(store
        .key_entry(key_alias, credential.key_store_password())
        .is_some());
    assert!(store.key_entry(key_alias, "wrong password").is_none());
}

#[test]
fn missing_file_names_the_path() {
    let path = fixture("does-not-exist.crt");
    let err = PemCredential::from_files(&path, fixture("client.key")).unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound { .. }));
    assert!(err.to_string().contains(&path), "{err}");
}

#[test]
fn directory_is_unreadable_not_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = PemCredential::from_files(dir.path(), fixture("client.key")).unwrap_err();
    assert!(matches!(err, Error::ResourceUnreadable { .. }), "{err}");
}

#[test]
fn plain_text_certificate_is_a_format_error() {
    let err = PemCredential::from_files(fixture("not_pem.txt"), fixture("client.key")).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidFormat {
            field: PemField::Certificate,
            problem: FormatProblem::MissingDelimiters
        }
    ));
    assert_eq!(err.to_string(), "Wrong certificate format");
}

#[test]
fn plain_text_key_is_a_format_error() {
    let err = PemCredential::from_files(fixture("client.crt"), fixture("not_pem.txt")).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidFormat {
            field: PemField::PrivateKey,
            problem: FormatProblem::MissingDelimiters
        }
    ));
    assert_eq!(err.to_string(), "Wrong private key format");
}

#[test]
fn delimited_garbage_fails_to_build() {
    let err = PemCredential::from_files(fixture("garbage.crt"), fixture("garbage.key")).unwrap_err();
    assert!(err.to_string().starts_with("unable to load credentials from"));
    match &err {
        Error::BuildFailure(DecodeError::Certificate(_)) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.source().is_some());
}

#[test]
fn ec_key_is_rejected() {
    let err = PemCredential::from_files(fixture("client.crt"), fixture("ec.key")).unwrap_err();
    assert!(matches!(err, Error::BuildFailure(DecodeError::PrivateKey(_))), "{err:?}");
}

#[test]
fn files_and_strings_agree() {
    let cert = std::fs::read_to_string(fixture("client.crt")).unwrap();
    let key = std::fs::read_to_string(fixture("client.key")).unwrap();
    let from_strings = PemCredential::from_strings(&cert, &key).unwrap();
    let from_files = PemCredential::from_files(fixture("client.crt"), fixture("client.key")).unwrap();
    assert_eq!(from_strings.subject(), from_files.subject());
    assert_eq!(from_strings.certificate_pem(), from_files.certificate_pem());
}

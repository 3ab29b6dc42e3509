//! Input hardening and resource limit tests
//!
//! Validates that hostile lookup input is rejected before it reaches the
//! dictionaries and that concurrent load stays bounded.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use hla_dictionary::core::snapshot::{JsonDirectorySource, NomenclatureSnapshot};
use hla_dictionary::dictionary::builder::{rebuild, BuildError};
use hla_dictionary::parsing::mac::parse_mac_text;
use hla_dictionary::utils::validation::{
    validate_lookup_name, validate_version, ValidationError, MAX_ALLELE_STRING_PARTS,
    MAX_LOOKUP_NAME_LENGTH,
};
use hla_dictionary::{
    DictionaryBuilder, DictionaryStore, HlaMetadataService, InMemoryDictionaryStore, Locus,
    LookupConfig, LookupError,
};

fn service() -> Arc<HlaMetadataService> {
    let snapshot =
        NomenclatureSnapshot::from_json(include_str!("data/snapshot_3400.json")).unwrap();
    let store = InMemoryDictionaryStore::new();
    store
        .publish(DictionaryBuilder::new(&snapshot).build().unwrap())
        .unwrap();
    let codes = parse_mac_text(include_str!("data/mac.tsv")).unwrap();
    Arc::new(HlaMetadataService::new(
        Arc::new(store),
        Arc::new(codes),
        LookupConfig::default(),
    ))
}

/// Test lookup name validation against injection-style input
#[test]
fn test_lookup_name_validation() {
    let hostile = [
        "01:01; DROP TABLE",
        "01:01\0",
        "<script>alert(1)</script>",
        "../../etc/passwd",
        "01:01%00",
    ];
    for name in hostile {
        assert!(
            matches!(
                validate_lookup_name(name),
                Err(ValidationError::InvalidLookupName(_))
            ),
            "{name:?} should be rejected"
        );
    }

    assert_eq!(
        validate_lookup_name(&"1".repeat(MAX_LOOKUP_NAME_LENGTH + 1)),
        Err(ValidationError::LookupNameTooLong)
    );
    assert_eq!(validate_lookup_name("   "), Err(ValidationError::EmptyLookupName));
}

/// Test version identifiers cannot escape the snapshot directory
#[test]
fn test_version_path_traversal_prevention() {
    for version in ["../3400", "..", "3400/../../x", "/etc/passwd", "34 00"] {
        assert!(validate_version(version).is_err(), "{version:?}");
    }
    assert!(validate_version(&"9".repeat(64)).is_err());
    assert!(validate_version("3400").is_ok());
    assert!(validate_version("3.40.0").is_ok());

    let dir = tempfile::tempdir().unwrap();
    let store = InMemoryDictionaryStore::new();
    let result = rebuild(&JsonDirectorySource::new(dir.path()), &store, "../3400");
    assert!(matches!(result, Err(BuildError::InvalidVersion(_))));
    assert!(store.versions().is_empty());
}

/// Test oversized allele strings are rejected before expansion
#[test]
fn test_allele_string_part_limit() {
    let service = service();
    let too_many = vec!["01:01"; MAX_ALLELE_STRING_PARTS + 1].join("/");

    let start = Instant::now();
    let result = service.lookup_typing(Locus::A, &too_many, "3400");
    assert!(matches!(result, Err(LookupError::InvalidTyping(_))));
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "Oversized input should be rejected quickly"
    );

    let at_limit = vec!["01:01"; MAX_ALLELE_STRING_PARTS].join("/");
    let result = service.lookup_typing(Locus::A, &at_limit, "3400").unwrap();
    assert_eq!(result.rows.len(), 1);
}

/// Test error messages carry only the caller's own input
#[test]
fn test_error_messages_do_not_leak_internals() {
    let service = service();
    let message = service
        .lookup_typing(Locus::A, "77:01", "3400")
        .unwrap_err()
        .to_string();
    assert_eq!(message, "Unrecognised HLA A*77:01");
}

/// Test many concurrent lookups complete within a bounded time
#[tokio::test]
async fn test_concurrent_lookup_flood() {
    let service = service();
    let names = ["01:AB", "01:XX", "24:02P", "01:01/02", "02:01:01:99", "77:01"];

    let start = Instant::now();
    let handles: Vec<_> = (0..200)
        .map(|i| {
            let service = Arc::clone(&service);
            let name = names[i % names.len()];
            tokio::task::spawn_blocking(move || service.lookup_typing(Locus::A, name, "3400"))
        })
        .collect();

    let results = timeout(Duration::from_secs(30), async {
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    })
    .await
    .expect("Lookups should not hang under load");

    let failures = results.iter().filter(|r| r.is_err()).count();
    // Only the unknown allele fails
    let expected = (0..200).filter(|i| i % names.len() == names.len() - 1).count();
    assert_eq!(failures, expected);
    assert!(start.elapsed() < Duration::from_secs(30));
}

//! HTTP API tests against an in-process router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use hla_dictionary::core::snapshot::NomenclatureSnapshot;
use hla_dictionary::parsing::mac::parse_mac_text;
use hla_dictionary::web::server::{api_router, create_router};
use hla_dictionary::{
    DictionaryBuilder, DictionaryStore, HlaMetadataService, InMemoryDictionaryStore, LookupConfig,
};

fn service() -> HlaMetadataService {
    let snapshot =
        NomenclatureSnapshot::from_json(include_str!("data/snapshot_3400.json")).unwrap();
    let store = InMemoryDictionaryStore::new();
    store
        .publish(DictionaryBuilder::new(&snapshot).build().unwrap())
        .unwrap();
    let codes = parse_mac_text(include_str!("data/mac.tsv")).unwrap();
    HlaMetadataService::new(Arc::new(store), Arc::new(codes), LookupConfig::default())
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_versions() {
    let (status, json) = get(api_router(service()), "/api/versions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["latest"], "3400");
    assert_eq!(json["versions"], serde_json::json!(["3400"]));
}

#[tokio::test]
async fn test_lookup_allele() {
    let (status, json) = get(
        api_router(service()),
        "/api/lookup?locus=B&name=39:01:01:02L",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "allele");
    assert_eq!(json["nomenclature_version"], "3400");
    assert_eq!(json["scoring_info"]["type"], "single_allele");
    assert_eq!(json["scoring_info"]["matching_p_group"], "39:01P");
}

#[tokio::test]
async fn test_lookup_with_explicit_category() {
    let (status, json) = get(
        api_router(service()),
        "/api/lookup?locus=A&name=01:XX&category=xx_code&version=3400",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["scoring_info"]["type"], "consolidated_molecular");
    assert_eq!(json["rows"], 3);
}

#[tokio::test]
async fn test_lookup_errors() {
    let (status, json) = get(api_router(service()), "/api/lookup?locus=A&name=77:01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_type"], "not_found");
    assert!(json["details"].is_null());

    let (status, json) = get(api_router(service()), "/api/lookup?locus=A&name=xyz").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_typing");

    let (status, json) = get(
        api_router(service()),
        "/api/lookup?locus=A&name=01:01&version=3390",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_type"], "version_not_found");
}

#[tokio::test]
async fn test_convert() {
    let (status, json) = get(
        api_router(service()),
        "/api/convert?locus=A&name=01:AB&target=two_field_allele_excluding_expression_suffix",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["names"], serde_json::json!(["01:01", "01:02"]));

    let (status, json) = get(
        api_router(service()),
        "/api/convert?locus=B&name=15&target=two_field_allele_excluding_expression_suffix",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error_type"], "unsupported_operation");

    let (status, json) = get(
        api_router(service()),
        "/api/convert?locus=A&name=01:01&target=two_field_allele_including_expression_suffix",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["names"], serde_json::json!(["01:01", "01:01N"]));
}

#[tokio::test]
async fn test_p_groups() {
    let (status, json) = get(api_router(service()), "/api/p-groups").await;
    assert_eq!(status, StatusCode::OK);
    let p_groups = json["p_groups"].as_array().unwrap();
    assert!(p_groups.iter().any(|p| p == "24:02P"));
    assert!(!p_groups.iter().any(|p| p == "99:01P"));
}

#[tokio::test]
async fn test_create_router_with_security_layers() {
    assert!(create_router(service()).is_ok());
}

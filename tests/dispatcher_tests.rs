//! Integration tests for generic resource dispatch.
//!
//! These tests drive every `Resource` operation against a mock control
//! plane and check the request it sends and the shape it returns.

mod common;

use serde_json::json;
use storage_api::rest::{Params, ResourceDescriptor, ResourceError};
use storage_api::{Context, HttpMethod, Payload, Resource};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn volumes(server: &MockServer) -> Resource {
    common::connect(server)
        .await
        .resource(ResourceDescriptor::new("volumes", "volume"))
}

fn ok_json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

// ============================================================================
// List / Get
// ============================================================================

#[tokio::test]
async fn test_list_returns_tagged_records_and_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .and(query_param("pool", "gold"))
        .and(header("Authorization", "Token test-token"))
        .respond_with(ok_json(json!([{"id": 1}, {"id": 2}])))
        .expect(1)
        .mount(&server)
        .await;

    let records = volumes(&server)
        .await
        .list(&Context::background(), &Params::new().with("pool", "gold"))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.resource_type() == Some("volume")));
}

#[tokio::test]
async fn test_list_with_no_matches_is_empty_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ok_json(json!([])))
        .mount(&server)
        .await;

    let records = volumes(&server)
        .await
        .list(&Context::background(), &Params::new().with("name", "nope"))
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_list_unwraps_pagination_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ok_json(json!({
            "results": [{"id": 1}, {"id": 2}],
            "count": 2,
            "next": null,
            "previous": null
        })))
        .mount(&server)
        .await;

    let records = volumes(&server)
        .await
        .list(&Context::background(), &Params::new())
        .await
        .unwrap();

    let ids: Vec<i64> = records.iter().filter_map(|r| r.get_i64("id")).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(records.iter().all(|r| r.resource_type() == Some("volume")));
}

#[tokio::test]
async fn test_get_single_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .and(query_param("name", "db01"))
        .respond_with(ok_json(json!([{"id": 4, "name": "db01"}])))
        .mount(&server)
        .await;

    let record = volumes(&server)
        .await
        .get(&Context::background(), &Params::new().with("name", "db01"))
        .await
        .unwrap();

    assert_eq!(record.get_i64("id"), Some(4));
}

#[tokio::test]
async fn test_get_zero_matches_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ok_json(json!([])))
        .mount(&server)
        .await;

    let error = volumes(&server)
        .await
        .get(&Context::background(), &Params::new().with("name", "db01"))
        .await
        .unwrap_err();

    assert!(error.is_not_found());
    assert!(error.to_string().contains("db01"));
}

#[tokio::test]
async fn test_get_single_empty_record_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ok_json(json!([{}])))
        .mount(&server)
        .await;

    let error = volumes(&server)
        .await
        .get(&Context::background(), &Params::new())
        .await
        .unwrap_err();

    assert!(error.is_not_found());
}

#[tokio::test]
async fn test_get_several_matches_is_too_many_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ok_json(json!([{"id": 1}, {"id": 2}, {"id": 3}])))
        .mount(&server)
        .await;

    let error = volumes(&server)
        .await
        .get(&Context::background(), &Params::new().with("pool", "gold"))
        .await
        .unwrap_err();

    match error {
        ResourceError::TooManyRecords {
            resource,
            count,
            params,
        } => {
            assert_eq!(resource, "volume");
            assert_eq!(count, 3);
            assert!(params.contains("gold"));
        }
        other => panic!("expected TooManyRecords, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_by_id_integral_and_opaque() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes/42"))
        .respond_with(ok_json(json!({"id": 42})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes/6f1c0f6e-0000-4000-8000-000000000001"))
        .respond_with(ok_json(json!({"id": "6f1c0f6e-0000-4000-8000-000000000001"})))
        .mount(&server)
        .await;

    let volumes = volumes(&server).await;
    let ctx = Context::background();

    let by_int = volumes.get_by_id(&ctx, 42_i64).await.unwrap();
    assert_eq!(by_int.get_i64("id"), Some(42));

    let uuid: uuid::Uuid = "6f1c0f6e-0000-4000-8000-000000000001".parse().unwrap();
    let by_uuid = volumes.get_by_id(&ctx, uuid).await.unwrap();
    assert_eq!(by_uuid.resource_type(), Some("volume"));
}

// ============================================================================
// Create / Update
// ============================================================================

#[tokio::test]
async fn test_create_posts_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/volumes"))
        .and(body_json(json!({"name": "db01", "size": 10})))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9, "name": "db01"})))
        .expect(1)
        .mount(&server)
        .await;

    let record = volumes(&server)
        .await
        .create(&Context::background(), json!({"name": "db01", "size": 10}))
        .await
        .unwrap();

    assert_eq!(record.get_i64("id"), Some(9));
}

#[tokio::test]
async fn test_update_patches_id_path() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/volumes/9"))
        .and(body_json(json!({"size": 20})))
        .respond_with(ok_json(json!({"id": 9, "size": 20})))
        .expect(1)
        .mount(&server)
        .await;

    let record = volumes(&server)
        .await
        .update(&Context::background(), 9_i64, json!({"size": 20}))
        .await
        .unwrap();

    assert_eq!(record.get_i64("size"), Some(20));
}

#[tokio::test]
async fn test_update_non_id_patches_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/system/settings"))
        .respond_with(ok_json(json!({"ntp": "pool.ntp.org"})))
        .expect(1)
        .mount(&server)
        .await;

    let settings = common::connect(&server)
        .await
        .resource(ResourceDescriptor::new("system/settings", "settings"));
    let record = settings
        .update_non_id(&Context::background(), json!({"ntp": "pool.ntp.org"}))
        .await
        .unwrap();

    assert_eq!(record.get_str("ntp"), Some("pool.ntp.org"));
}

#[tokio::test]
async fn test_create_with_async_envelope_yields_task_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/volumes"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"task_id": 77})))
        .mount(&server)
        .await;

    let record = volumes(&server)
        .await
        .create(&Context::background(), json!({"name": "db01"}))
        .await
        .unwrap();

    assert_eq!(record.resource_type(), Some("task"));
    assert_eq!(record.get_i64("id"), Some(77));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .and(query_param("name", "db01"))
        .respond_with(ok_json(json!([{"id": 5, "name": "db01"}])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .and(query_param("name", "db01"))
        .respond_with(ok_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/volumes/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let volumes = volumes(&server).await;
    let ctx = Context::background();
    let search = Params::new().with("name", "db01");

    volumes.delete(&ctx, &search, &Params::new()).await.unwrap();
    volumes.delete(&ctx, &search, &Params::new()).await.unwrap();
}

#[tokio::test]
async fn test_delete_propagates_other_lookup_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ok_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;

    let error = volumes(&server)
        .await
        .delete(&Context::background(), &Params::new(), &Params::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ResourceError::TooManyRecords { .. }));
}

#[tokio::test]
async fn test_delete_match_without_id_is_missing_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ok_json(json!([{"name": "db01"}])))
        .mount(&server)
        .await;

    let error = volumes(&server)
        .await
        .delete(&Context::background(), &Params::new(), &Params::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ResourceError::MissingId { .. }));
}

#[tokio::test]
async fn test_delete_by_id_sends_query_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/volumes/5"))
        .and(query_param("force", "true"))
        .and(body_json(json!({"keep_snapshots": false})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    volumes(&server)
        .await
        .delete_by_id(
            &Context::background(),
            5_i64,
            &Params::new().with("force", true),
            &Params::new().with("keep_snapshots", false),
        )
        .await
        .unwrap();
}

// ============================================================================
// Ensure / Exists
// ============================================================================

#[tokio::test]
async fn test_ensure_returns_existing_without_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ok_json(json!([{"id": 3, "name": "db01", "size": 10}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let record = volumes(&server)
        .await
        .ensure(
            &Context::background(),
            &Params::new().with("name", "db01"),
            json!({"name": "db01", "size": 99}),
        )
        .await
        .unwrap();

    assert_eq!(record.get_i64("size"), Some(10));
}

#[tokio::test]
async fn test_ensure_by_name_creates_with_injected_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .and(query_param("name", "db02"))
        .respond_with(ok_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/volumes"))
        .and(body_json(json!({"size": 5, "name": "db02"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 8, "name": "db02"})))
        .expect(1)
        .mount(&server)
        .await;

    let record = volumes(&server)
        .await
        .ensure_by_name(&Context::background(), "db02", json!({"size": 5}))
        .await
        .unwrap();

    assert_eq!(record.get_i64("id"), Some(8));
}

#[tokio::test]
async fn test_ensure_propagates_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let error = volumes(&server)
        .await
        .ensure(&Context::background(), &Params::new(), json!({}))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert!(error.to_string().contains("boom"));
}

#[tokio::test]
async fn test_exists_semantics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("name", "one"))
        .respond_with(ok_json(json!([{"id": 1}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("name", "none"))
        .respond_with(ok_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("name", "many"))
        .respond_with(ok_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;

    let volumes = volumes(&server).await;
    let ctx = Context::background();

    assert!(volumes.exists(&ctx, &Params::new().with("name", "one")).await);
    assert!(!volumes.exists(&ctx, &Params::new().with("name", "none")).await);
    assert!(volumes.exists(&ctx, &Params::new().with("name", "many")).await);
}

#[tokio::test]
async fn test_must_exists_surfaces_other_failures_as_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("name", "none"))
        .respond_with(ok_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("name", "broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let volumes = volumes(&server).await;
    let ctx = Context::background();

    assert!(!volumes
        .must_exists(&ctx, &Params::new().with("name", "none"))
        .await
        .unwrap());

    let fatal = volumes
        .must_exists(&ctx, &Params::new().with("name", "broken"))
        .await
        .unwrap_err();
    assert_eq!(fatal.into_inner().status(), Some(503));
}

// ============================================================================
// Raw calls and body shapes
// ============================================================================

#[tokio::test]
async fn test_raw_request_is_untagged_and_accepts_raw_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/hosts/3/ports"))
        .and(query_param("id__in", "1,2"))
        .respond_with(ok_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;

    let client = common::connect(&server).await;
    let hosts = client.resource(ResourceDescriptor::new("hosts", "host"));
    let ports_path = hosts.path_for(&3_i64.into(), &["ports"]);

    let payload: Payload = client
        .raw()
        .request(
            &Context::background(),
            HttpMethod::Get,
            &ports_path,
            &Params::raw("id__in=1,2"),
            None,
        )
        .await
        .unwrap();

    let Payload::RecordSet(set) = payload else {
        panic!("expected record set");
    };
    assert_eq!(set.len(), 2);
    assert!(set.iter().all(|r| r.resource_type().is_none()));
}

#[tokio::test]
async fn test_no_content_is_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/system/reboot"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let payload: Payload = common::connect(&server)
        .await
        .raw()
        .request(
            &Context::background(),
            HttpMethod::Post,
            "system/reboot",
            &Params::new(),
            Some(json!({})),
        )
        .await
        .unwrap();

    assert_eq!(payload, Payload::Empty);
}

#[tokio::test]
async fn test_no_content_where_record_expected_is_shape_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/volumes/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let error = volumes(&server)
        .await
        .update(&Context::background(), 7_i64, json!({"size_gb": 200}))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ResourceError::ShapeMismatch {
            expected: "record",
            actual: "empty result",
            ..
        }
    ));
}

#[tokio::test]
async fn test_unrepresentable_retry_after_uses_fixed_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1e300"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ok_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let config = common::config_builder(&server).tries(2).build().unwrap();
    let records = common::connect_with(config)
        .await
        .resource(ResourceDescriptor::new("volumes", "volume"))
        .list(&Context::background(), &Params::new())
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/volumes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let error = volumes(&server)
        .await
        .list(&Context::background(), &Params::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ResourceError::Parse(_)));
}

#[tokio::test]
async fn test_api_version_override_changes_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/links"))
        .respond_with(ok_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let links = common::connect(&server).await.resource(
        ResourceDescriptor::new("links", "link")
            .with_api_version(storage_api::ApiVersion::new("v2").unwrap()),
    );
    links
        .list(&Context::background(), &Params::new())
        .await
        .unwrap();
}

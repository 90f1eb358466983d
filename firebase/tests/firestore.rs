//! Firestore client against a mock server

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use futures::StreamExt;
use larder_firebase::{FirebaseError, FirebaseOptions, FirestoreClient, Value};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{
    bearer_token, body_partial_json, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COLLECTION: &str = "artifacts/app/users/u1/refrigerator_inventory";
const LIST_PATH: &str =
    "/v1/projects/demo/databases/(default)/documents/artifacts/app/users/u1/refrigerator_inventory";

fn client(server: &MockServer) -> FirestoreClient {
    FirestoreClient::new(&FirebaseOptions::new("k", "demo"))
        .with_api_url(format!("{}/v1", server.uri()))
}

fn doc(id: &str, name: &str) -> serde_json::Value {
    json!({
        "name": format!("projects/demo/databases/(default)/documents/{COLLECTION}/{id}"),
        "fields": {
            "name": { "stringValue": name },
            "quantity": { "integerValue": "1" },
            "timestamp": { "timestampValue": "2024-01-01T00:00:00Z" }
        },
        "createTime": "2024-01-01T00:00:00Z",
        "updateTime": "2024-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn create_commits_with_server_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/demo/databases/(default)/documents:commit"))
        .and(bearer_token("id-token"))
        .and(body_partial_json(json!({
            "writes": [{
                "currentDocument": { "exists": false },
                "updateTransforms": [
                    { "fieldPath": "timestamp", "setToServerValue": "REQUEST_TIME" }
                ],
                "update": {
                    "fields": {
                        "name": { "stringValue": "Milk" },
                        "quantity": { "integerValue": "2" }
                    }
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{ "updateTime": "2024-01-01T00:00:00Z" }],
            "commitTime": "2024-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = BTreeMap::new();
    fields.insert("name".to_string(), Value::from("Milk"));
    fields.insert("quantity".to_string(), Value::from(2));

    let id = client(&server)
        .create_document("id-token", COLLECTION, fields, Some("timestamp"))
        .await
        .unwrap();

    assert_eq!(id.len(), 20);
}

#[tokio::test]
async fn create_conflict_is_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/demo/databases/(default)/documents:commit"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_document("t", COLLECTION, BTreeMap::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err, FirebaseError::AlreadyExists);
}

#[tokio::test]
async fn delete_targets_the_document() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{LIST_PATH}/abc")))
        .and(bearer_token("id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete_document("id-token", COLLECTION, "abc")
        .await
        .unwrap();
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .delete_document("t", COLLECTION, "abc")
        .await
        .unwrap_err();
    assert_eq!(err, FirebaseError::Unauthorized);
}

#[tokio::test]
async fn list_follows_page_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("pageSize", "300"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("a", "Milk")],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("b", "Eggs")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let docs = client(&server).list_documents("t", COLLECTION).await.unwrap();

    let ids: Vec<_> = docs.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(docs[1].field("name").and_then(Value::as_str), Some("Eggs"));
    assert_eq!(docs[0].field("quantity").and_then(Value::as_i64), Some(1));
}

#[tokio::test]
async fn empty_collection_lists_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let docs = client(&server).list_documents("t", COLLECTION).await.unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn listen_yields_only_changes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("a", "Milk")]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("a", "Milk"), doc("b", "Eggs")]
        })))
        .mount(&server)
        .await;

    let stream = client(&server).listen(COLLECTION, Duration::from_millis(20), || async {
        Ok("t".to_string())
    });
    futures::pin_mut!(stream);

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);

    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(second.len(), 2);

    // The listing no longer changes, so nothing else arrives
    let third = tokio::time::timeout(Duration::from_millis(150), stream.next()).await;
    assert!(third.is_err());
}

#[tokio::test]
async fn listen_with_zero_interval_still_polls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("a", "Milk")]
        })))
        .mount(&server)
        .await;

    let stream = client(&server).listen(COLLECTION, Duration::ZERO, || async {
        Ok("t".to_string())
    });
    futures::pin_mut!(stream);

    let first = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(first.len(), 1);
}

#[tokio::test]
async fn listen_relists_right_after_a_local_write() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documents": [] })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [doc("a", "Milk")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let firestore = client(&server);
    // Long interval: only the write can trigger the second listing in time
    let stream = firestore.listen(COLLECTION, Duration::from_secs(60), || async {
        Ok("t".to_string())
    });
    futures::pin_mut!(stream);

    assert!(stream.next().await.unwrap().unwrap().is_empty());

    firestore.delete_document("t", COLLECTION, "zzz").await.unwrap();

    let next = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("write should trigger a re-list")
        .unwrap()
        .unwrap();
    assert_eq!(next.len(), 1);
}

#[tokio::test]
async fn listen_ends_after_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let stream = client(&server).listen(COLLECTION, Duration::from_millis(10), || async {
        Ok("t".to_string())
    });
    futures::pin_mut!(stream);

    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(
        err,
        FirebaseError::ApiError {
            status: 500,
            message: "boom".to_string()
        }
    );
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn listen_reports_token_failures() {
    let firestore = FirestoreClient::new(&FirebaseOptions::new("k", "demo"));
    let stream = firestore.listen(COLLECTION, Duration::from_millis(10), || async {
        Err(FirebaseError::Unauthorized)
    });
    futures::pin_mut!(stream);

    assert_eq!(
        stream.next().await.unwrap().unwrap_err(),
        FirebaseError::Unauthorized
    );
}

// tests/session_api.rs
//! Authenticated session behavior against a mock server.

mod common;

use common::{failed, hits, mount_token, ok, session, text_block, TOKEN_PATH};
use feishu_docs::{AppError, Block, BlockId, DocumentId, FolderToken, SpaceId, TextStyle};
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer};

const DOC: &str = "doxcnTest";
const INFO_PATH: &str = "/docx/v1/documents/doxcnTest";
const ROOT_CHILDREN: &str = "/docx/v1/documents/doxcnTest/blocks/doxcnTest/children";

fn doc() -> DocumentId {
    DocumentId::new(DOC).unwrap()
}

fn info_data() -> serde_json::Value {
    json!({ "document": { "document_id": DOC, "revision_id": 4, "title": "Weekly" } })
}

#[tokio::test]
async fn test_credential_reused_across_calls() {
    let server = MockServer::start().await;
    mount_token(&server, "t-first").await;
    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .and(header("Authorization", "Bearer t-first"))
        .respond_with(ok(info_data()))
        .mount(&server)
        .await;

    let client = session(&server);
    let first = client.get_document_info(&doc()).await.unwrap();
    let second = client.get_document_info(&doc()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.title, "Weekly");
    assert_eq!(first.revision_id, Some(4));
    assert_eq!(hits(&server, TOKEN_PATH).await, 1);
}

#[tokio::test]
async fn test_stale_credential_retried_once() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(failed(99991677, "token expired"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(ok(info_data()))
        .mount(&server)
        .await;

    let info = session(&server).get_document_info(&doc()).await.unwrap();

    assert_eq!(info.document_id.as_str(), DOC);
    assert_eq!(hits(&server, INFO_PATH).await, 2);
    assert_eq!(hits(&server, TOKEN_PATH).await, 2);
}

#[tokio::test]
async fn test_second_stale_response_is_surfaced() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(failed(99991401, "invalid token"))
        .mount(&server)
        .await;

    let err = session(&server).get_document_info(&doc()).await.unwrap_err();

    assert!(matches!(err, AppError::Api { code: 99991401, .. }));
    assert_eq!(hits(&server, INFO_PATH).await, 2);
}

#[tokio::test]
async fn test_other_api_errors_are_not_retried() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(failed(1770002, "not found"))
        .mount(&server)
        .await;

    let err = session(&server).get_document_info(&doc()).await.unwrap_err();

    match err {
        AppError::Api { code, message } => {
            assert_eq!(code, 1770002);
            assert_eq!(message, "not found");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
    assert_eq!(hits(&server, INFO_PATH).await, 1);
}

#[tokio::test]
async fn test_rejected_app_secret_is_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 10014, "msg": "app secret invalid" })),
        )
        .mount(&server)
        .await;

    let err = session(&server).get_document_info(&doc()).await.unwrap_err();

    assert!(matches!(err, AppError::AuthenticationFailed { code: 10014, .. }));
    assert_eq!(hits(&server, INFO_PATH).await, 0);
}

async fn mount_three_block_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .and(query_param_is_missing("page_token"))
        .respond_with(ok(json!({
            "items": [text_block("b1", "one")],
            "page_token": "a",
            "has_more": true
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .and(query_param("page_token", "a"))
        .respond_with(ok(json!({
            "items": [text_block("b2", "two")],
            "page_token": "b",
            "has_more": true
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .and(query_param("page_token", "b"))
        .respond_with(ok(json!({
            "items": [text_block("b3", "three")],
            "has_more": false
        })))
        .mount(server)
        .await;
}

fn ids(blocks: &[feishu_docs::DocumentBlock]) -> Vec<&str> {
    blocks.iter().map(|b| b.block_id.as_str()).collect()
}

#[tokio::test]
async fn test_all_blocks_follow_cursors_in_order() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    mount_three_block_pages(&server).await;

    let blocks = session(&server).get_all_blocks(&doc()).await.unwrap();

    assert_eq!(ids(&blocks), vec!["b1", "b2", "b3"]);
    let cursors: Vec<Option<String>> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == ROOT_CHILDREN)
        .map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "page_token")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert_eq!(cursors, vec![None, Some("a".to_string()), Some("b".to_string())]);
}

#[tokio::test]
async fn test_streamed_blocks_match_eager_listing() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    mount_three_block_pages(&server).await;

    let client = session(&server);
    let document = doc();
    let streamed: Vec<_> = client.stream_all_blocks(&document).try_collect().await.unwrap();

    assert_eq!(ids(&streamed), vec!["b1", "b2", "b3"]);
}

#[tokio::test]
async fn test_repeated_cursor_is_protocol_error() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(ok(json!({
            "items": [text_block("b1", "one")],
            "page_token": "same",
            "has_more": true
        })))
        .mount(&server)
        .await;

    let err = session(&server).get_all_blocks(&doc()).await.unwrap_err();

    assert!(matches!(err, AppError::Protocol(_)));
    assert_eq!(hits(&server, ROOT_CHILDREN).await, 2);
}

#[tokio::test]
async fn test_block_tree_fetches_children_of_parents() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(ok(json!({
            "items": [
                {
                    "block_id": "list",
                    "block_type": "bullet",
                    "children": ["item"],
                    "bullet": { "elements": [ { "text_run": { "content": "steps" } } ] }
                },
                text_block("tail", "done")
            ],
            "has_more": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docx/v1/documents/doxcnTest/blocks/list/children"))
        .respond_with(ok(json!({
            "items": [{
                "block_id": "item",
                "parent_id": "list",
                "block_type": "ordered",
                "ordered": { "elements": [ { "text_run": { "content": "first" } } ] }
            }],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let forest = session(&server).get_block_tree(&doc()).await.unwrap();

    assert_eq!(forest.len(), 3);
    assert_eq!(
        feishu_docs::render_forest(&forest),
        "- steps\n  1. first\ndone"
    );
}

#[tokio::test]
async fn test_create_block_sends_wire_shape() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("POST"))
        .and(path(ROOT_CHILDREN))
        .and(query_param("document_revision_id", "-1"))
        .and(body_partial_json(json!({
            "index": -1,
            "children": [{
                "block_type": "heading",
                "heading": { "level": 2, "elements": [ { "text_run": { "content": "Intro" } } ] }
            }]
        })))
        .respond_with(ok(json!({ "children": [ { "block_id": "new1" } ] })))
        .mount(&server)
        .await;

    let document = doc();
    let parent: BlockId = BlockId::new(DOC).unwrap();
    let block = Block::heading("Intro", 2, None).unwrap();
    let created = session(&server)
        .create_block(&document, &parent, &block, feishu_docs::constants::APPEND_INDEX)
        .await
        .unwrap();

    assert_eq!(created.as_str(), "new1");
}

#[tokio::test]
async fn test_batch_create_returns_ids_in_order() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("POST"))
        .and(path("/docx/v1/documents/doxcnTest/blocks/batch_create"))
        .and(body_partial_json(json!({
            "requests": [{ "parent_block_id": "parent1", "index": 0 }]
        })))
        .respond_with(ok(json!({
            "blocks": [ { "block_id": "n1" }, { "block_id": "n2" } ]
        })))
        .mount(&server)
        .await;

    let blocks = vec![
        Block::text("first", TextStyle::plain()),
        Block::bullet("second", TextStyle::plain()),
    ];
    let created = session(&server)
        .batch_create_blocks(&doc(), &BlockId::new("parent1").unwrap(), &blocks, 0)
        .await
        .unwrap();

    let created: Vec<&str> = created.iter().map(BlockId::as_str).collect();
    assert_eq!(created, vec!["n1", "n2"]);
}

#[tokio::test]
async fn test_update_and_delete_target_the_block() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    let block_path = "/docx/v1/documents/doxcnTest/blocks/blk9";
    Mock::given(method("PATCH"))
        .and(path(block_path))
        .and(body_partial_json(json!({
            "block_type": "text",
            "text": { "elements": [ { "text_run": {
                "content": "edited",
                "text_element_style": { "bold": true }
            } } ] }
        })))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(block_path))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = session(&server);
    let block_id = BlockId::new("blk9").unwrap();
    client
        .update_block(&doc(), &block_id, &Block::text("edited", TextStyle::plain().with_bold()))
        .await
        .unwrap();
    client.delete_block(&doc(), &block_id).await.unwrap();
}

#[tokio::test]
async fn test_wiki_children_pass_parent_and_paginate() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    let nodes_path = "/wiki/v2/spaces/7001/nodes";
    Mock::given(method("GET"))
        .and(path(nodes_path))
        .and(query_param("parent_node_token", "wikcnParent"))
        .and(query_param_is_missing("page_token"))
        .respond_with(ok(json!({
            "items": [ { "node_token": "wikcnA", "title": "A", "has_child": false } ],
            "page_token": "p2",
            "has_more": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(nodes_path))
        .and(query_param("page_token", "p2"))
        .respond_with(ok(json!({
            "items": [ { "node_token": "wikcnB", "title": "B", "has_child": true } ],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let parent = feishu_docs::NodeToken::new("wikcnParent").unwrap();
    let children = session(&server)
        .list_wiki_children(&SpaceId::new("7001").unwrap(), Some(&parent))
        .await
        .unwrap();

    let titles: Vec<&str> = children.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B"]);
    assert!(children[1].has_child);
}

#[tokio::test]
async fn test_create_wiki_node_returns_backing_document() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("POST"))
        .and(path("/wiki/v2/spaces/7001/nodes"))
        .and(body_partial_json(json!({
            "obj_type": "docx",
            "node_type": "origin",
            "title": "Runbook"
        })))
        .respond_with(ok(json!({
            "node": { "node_token": "wikcnNew", "obj_token": "doxcnBacking", "title": "Runbook" }
        })))
        .mount(&server)
        .await;

    let created = session(&server)
        .create_wiki_node(&SpaceId::new("7001").unwrap(), "Runbook", None)
        .await
        .unwrap();

    assert_eq!(created.node_token.as_str(), "wikcnNew");
    assert_eq!(created.document_id.as_str(), "doxcnBacking");
}

#[tokio::test]
async fn test_folder_operations() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("GET"))
        .and(path("/drive/v1/root_folder/meta"))
        .respond_with(ok(json!({ "token": "fldcnRoot", "id": "1", "user_id": "ou_1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v1/files/fldcnRoot/children"))
        .respond_with(ok(json!({
            "items": [
                { "token": "fldcnSub", "name": "Specs", "type": "folder" },
                { "token": "doxcnX", "name": "Notes", "type": "docx" }
            ],
            "has_more": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/drive/v1/files/fldcnRoot/children"))
        .and(body_partial_json(json!({ "type": "folder", "name": "Archive" })))
        .respond_with(ok(json!({ "file": { "token": "fldcnArchive" } })))
        .mount(&server)
        .await;

    let client = session(&server);
    let root = client.get_root_folder().await.unwrap();
    assert_eq!(root.token.as_str(), "fldcnRoot");

    let entries = client.list_folder_children(&root.token).await.unwrap();
    let folders: Vec<&str> = entries
        .iter()
        .filter(|e| e.is_folder())
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(folders, vec!["Specs"]);

    let created = client.create_folder(&root.token, "Archive").await.unwrap();
    assert_eq!(created, FolderToken::new("fldcnArchive").unwrap());
}

#[tokio::test]
async fn test_search_sends_filter() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("POST"))
        .and(path("/search/v2/message"))
        .and(body_partial_json(json!({
            "query": "roadmap",
            "count": 5,
            "filter": { "document_formats": ["docx"] }
        })))
        .respond_with(ok(json!({
            "items": [ { "title": "Roadmap 2026", "document_id": "doxcnR", "score": 0.9 } ]
        })))
        .mount(&server)
        .await;

    let hits = session(&server)
        .search_documents("roadmap", Some("docx"), 5)
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Roadmap 2026");
    assert_eq!(hits[0].extra.get("score"), Some(&json!(0.9)));
}

#[tokio::test]
async fn test_upload_image_returns_file_token() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    Mock::given(method("POST"))
        .and(path("/drive/v1/medias/upload_all"))
        .respond_with(ok(json!({ "file_token": "boxcnUploaded" })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("chart.png");
    std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

    let token = session(&server).upload_image(&image, None).await.unwrap();

    assert_eq!(token.as_str(), "boxcnUploaded");
    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/drive/v1/medias/upload_all")
        .unwrap();
    let body = String::from_utf8_lossy(&upload.body);
    assert!(body.contains("chart.png"));
    assert!(body.contains("image/png"));
}

#[tokio::test]
async fn test_streamed_folder_children_follow_cursors() {
    let server = MockServer::start().await;
    mount_token(&server, "t-any").await;
    let children_path = "/drive/v1/files/fldcnRoot/children";
    Mock::given(method("GET"))
        .and(path(children_path))
        .and(query_param_is_missing("page_token"))
        .respond_with(ok(json!({
            "items": [ { "token": "doxcn1", "name": "One", "type": "docx" } ],
            "page_token": "f2",
            "has_more": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(children_path))
        .and(query_param("page_token", "f2"))
        .respond_with(ok(json!({
            "items": [ { "token": "fldcnTwo", "name": "Two", "type": "folder" } ],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let client = session(&server);
    let folder = FolderToken::new("fldcnRoot").unwrap();
    let entries: Vec<_> = client
        .stream_folder_children(&folder)
        .try_collect()
        .await
        .unwrap();

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Two"]);
    assert!(entries[1].is_folder());
}

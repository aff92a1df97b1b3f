//! End-to-end tests for the query engine against on-disk fixtures

use std::path::PathBuf;
use std::sync::Mutex;

use pretty_assertions::assert_eq;
use query_template_engine::{
    BackendError, BackendExecutor, BackendRequest, EngineConfig, EngineError, FsSource, Method,
    QueryEngine, QueryKind, QueryParams, TemplatePaths,
};
use serde::Serialize;
use serde_json::{json, Value};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[derive(Default)]
struct Recorder {
    requests: Mutex<Vec<BackendRequest>>,
}

impl BackendExecutor for Recorder {
    fn execute(&self, request: &BackendRequest) -> Result<Value, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(json!({ "hits": { "hits": [] } }))
    }
}

struct Unavailable;

impl BackendExecutor for Unavailable {
    fn execute(&self, request: &BackendRequest) -> Result<Value, BackendError> {
        Err(BackendError::Transport {
            method: request.method,
            path: request.path(),
            message: "connection refused".to_string(),
        })
    }
}

fn engine() -> QueryEngine<Recorder> {
    QueryEngine::new(
        FsSource::new(fixtures()),
        EngineConfig::default(),
        Recorder::default(),
    )
}

fn sent(engine: &QueryEngine<Recorder>) -> Vec<BackendRequest> {
    engine.dispatcher().executor().requests.lock().unwrap().clone()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserTemplateParams {
    user_id: Option<u64>,
    user_name: Option<String>,
    min_score: Option<f64>,
    courses: Vec<String>,
}

impl QueryParams for UserTemplateParams {}

#[test]
fn test_search_by_user_id() {
    let engine = engine();
    let response = engine
        .execute_template("USER_OPERATIONS", "searchByUserId", &json!({ "userId": 1 }))
        .expect("Should execute");
    assert_eq!(response, json!({ "hits": { "hits": [] } }));

    let requests = sent(&engine);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].path(), "/user/_search");
    assert_eq!(
        requests[0].body.as_deref(),
        Some(r#"{"query":{"term":{"userId":"1"}}}"#)
    );
}

#[test]
fn test_typed_params() {
    let engine = engine();
    let query = engine
        .resolve(
            "USER_OPERATIONS",
            "searchByUserId",
            &UserTemplateParams {
                user_id: Some(42),
                user_name: None,
                min_score: None,
                courses: vec![],
            },
        )
        .expect("Should resolve");
    assert_eq!(query.body, r#"{"query":{"term":{"userId":"42"}}}"#);
    assert_eq!(query.collection, "user");
}

#[test]
fn test_grouped_msearch_posts() {
    let engine = engine();
    engine
        .execute_template("USER_OPERATIONS", "multiSearchUsers", &json!({}))
        .expect("Should execute");

    let requests = sent(&engine);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path(), "/user/_msearch");
}

#[test]
fn test_class_average_targets_class_collection() {
    let engine = engine();
    let query = engine
        .resolve("CLASS_AVERAGE", "averageByCourse", &json!({ "course": "Math" }))
        .expect("Should resolve");
    assert_eq!(query.kind, QueryKind::Aggregation);
    assert_eq!(query.collection, "class");

    engine
        .execute_template("CLASS_AVERAGE", "averageByCourse", &json!({ "course": "Math" }))
        .expect("Should execute");
    let requests = sent(&engine);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].path(), "/class/_search");

    let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap())
        .expect("Rendered body should be JSON");
    assert_eq!(body["query"]["term"]["course"], "Math");
    assert_eq!(body["size"], 0);
}

#[test]
fn test_unknown_template_does_not_change_cache() {
    let engine = engine();
    engine
        .resolve("USER_OPERATIONS", "searchByUserId", &json!({ "userId": 1 }))
        .expect("Should resolve");
    assert_eq!(engine.cache().len(), 1);

    let err = engine
        .execute_template("USER_OPERATIONS", "noSuchTemplate", &json!({}))
        .expect_err("Should fail");
    assert!(matches!(err, EngineError::NotFound { kind: "template", .. }));
    assert!(err.is_client_error());
    assert_eq!(engine.cache().len(), 1);
    assert!(sent(&engine).is_empty());
}

#[test]
fn test_unknown_group_is_not_found() {
    let engine = engine();
    let err = engine
        .execute_template("GHOST_OPERATIONS", "anything", &json!({}))
        .expect_err("Should fail");
    assert!(matches!(
        err,
        EngineError::NotFound {
            kind: "template group",
            ..
        }
    ));
    assert!(engine.cache().is_empty());
}

#[test]
fn test_syntax_error_in_group_template() {
    let engine = engine();
    let err = engine
        .execute_template("BROKEN_OPS", "unclosed", &json!({ "userId": 1 }))
        .expect_err("Should fail");
    assert!(matches!(err, EngineError::TemplateSyntax { .. }));
    assert!(!err.is_client_error());
    let report = err.report().expect("Should have a report");
    assert!(report.contains("unclosed"));
    assert!(sent(&engine).is_empty());
}

#[test]
fn test_adhoc_search_with_optional_clause() {
    let engine = engine();
    engine
        .search(
            "user",
            "search-by-name.json",
            &UserTemplateParams {
                user_id: None,
                user_name: Some("Jane".to_string()),
                min_score: Some(80.0),
                courses: vec![],
            },
        )
        .expect("Should search");
    engine
        .search("user", "search-by-name.json", &json!({ "userName": "John" }))
        .expect("Should search");

    let requests = sent(&engine);
    assert_eq!(requests[0].path(), "/user/_search");

    let with_score: Value = serde_json::from_str(requests[0].body.as_deref().unwrap())
        .expect("Rendered body should be JSON");
    assert_eq!(
        with_score,
        json!({ "query": { "bool": { "must": [
            { "match": { "userName": "Jane" } },
            { "range": { "grades.score": { "gte": 80.0 } } }
        ] } } })
    );

    let without_score: Value = serde_json::from_str(requests[1].body.as_deref().unwrap())
        .expect("Rendered body should be JSON");
    assert_eq!(
        without_score,
        json!({ "query": { "bool": { "must": [ { "match": { "userName": "John" } } ] } } })
    );
}

#[test]
fn test_adhoc_msearch_renders_line_per_course() {
    let engine = engine();
    engine
        .msearch(
            "grade",
            "by-courses.ndjson",
            &json!({ "courses": ["Math", "Art"] }),
        )
        .expect("Should msearch");

    let requests = sent(&engine);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path(), "/grade/_msearch");
    let lines: Vec<Value> = requests[0]
        .body
        .as_deref()
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).expect("Each line should be JSON"))
        .collect();
    assert_eq!(
        lines,
        vec![
            json!({ "index": "grade" }),
            json!({ "query": { "term": { "course": "Math" } } }),
            json!({ "index": "grade" }),
            json!({ "query": { "term": { "course": "Art" } } }),
        ]
    );
}

#[test]
fn test_backend_failure_passes_through() {
    let engine = QueryEngine::new(FsSource::new(fixtures()), EngineConfig::default(), Unavailable);
    let err = engine
        .execute_template("USER_OPERATIONS", "searchByUserId", &json!({ "userId": 1 }))
        .expect_err("Should fail");
    match err {
        EngineError::Backend(BackendError::Transport { path, .. }) => {
            assert_eq!(path, "/user/_search");
        }
        other => panic!("Expected transport error, got {:?}", other),
    }
    // The group load succeeded and stays cached
    assert!(engine.cache().contains("USER_OPERATIONS"));
}

#[test]
fn test_custom_paths_from_config() {
    let config = EngineConfig::from_str(
        r#"
[templates]
template_path = "tpl/"
group_path = "groups/"
"#,
    )
    .expect("Should parse");
    assert_eq!(
        config.templates,
        TemplatePaths::new()
            .with_template_path("tpl/")
            .with_group_path("groups/")
    );

    let engine = QueryEngine::new(FsSource::new(fixtures()), config, Recorder::default());
    let err = engine
        .execute_template("USER_OPERATIONS", "searchByUserId", &json!({}))
        .expect_err("Groups live elsewhere under this config");
    assert!(matches!(err, EngineError::NotFound { .. }));
}

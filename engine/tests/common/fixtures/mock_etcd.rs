//! Mock etcd member for testing
//!
//! Serves `/version` and, for protocol 2, a stateful `/v2/keys` API backed
//! by an in-memory map, so backups and restores can run end to end without
//! a real etcd. Protocol-3 prefix reads are mocked per prefix on the JSON
//! gateway.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use wiremock::{
    matchers::{body_partial_json, method, path, path_regex},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

type Keyspace = Arc<Mutex<BTreeMap<String, String>>>;

/// Mock etcd server
pub struct MockEtcd {
    pub server: MockServer,
    pub base_url: String,
    keys: Keyspace,
}

impl MockEtcd {
    /// etcd 2.3.7 with an empty keyspace
    pub async fn start_v2() -> Self {
        let etcd = Self::start_with_version("2.3.7").await;
        Mock::given(path_regex("^/v2/keys"))
            .respond_with(KeysApi {
                keys: etcd.keys.clone(),
            })
            .mount(&etcd.server)
            .await;
        etcd
    }

    /// etcd 3.1.0; prefixes must be mocked with [`MockEtcd::mock_v3_prefix`]
    pub async fn start_v3() -> Self {
        Self::start_with_version("3.1.0").await
    }

    /// Only the version endpoint, reporting `version`
    pub async fn start_with_version(version: &str) -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();

        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "etcdserver": version,
                "etcdcluster": version,
            })))
            .mount(&server)
            .await;

        Self {
            server,
            base_url,
            keys: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Seeds a key directly, bypassing the API
    pub fn put(&self, key: &str, value: &str) {
        self.keys
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.keys.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> BTreeMap<String, String> {
        self.keys.lock().unwrap().clone()
    }

    /// Answers a v3 range read on `prefix` with one key, or with none
    pub async fn mock_v3_prefix(&self, prefix: &str, present: bool) {
        let body = if present {
            json!({
                "header": { "revision": "7" },
                "kvs": [{
                    "key": BASE64.encode(format!("{}/namespaces/default", prefix)),
                    "value": BASE64.encode("{}"),
                }],
                "count": "1",
            })
        } else {
            json!({ "header": { "revision": "7" } })
        };

        Mock::given(method("POST"))
            .and(path("/v3/kv/range"))
            .and(body_partial_json(json!({ "key": BASE64.encode(prefix) })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// PUT requests received so far
    pub async fn write_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == "PUT")
            .count()
    }
}

/// Stateful responder for the v2 keys API
struct KeysApi {
    keys: Keyspace,
}

impl KeysApi {
    fn not_found(key: &str) -> ResponseTemplate {
        ResponseTemplate::new(404).set_body_json(json!({
            "errorCode": 100,
            "message": "Key not found",
            "cause": key,
            "index": 1,
        }))
    }

    fn get(&self, key: &str, recursive: bool) -> ResponseTemplate {
        let keys = self.keys.lock().unwrap();

        if key == "/" {
            return ResponseTemplate::new(200).set_body_json(json!({
                "action": "get",
                "node": { "dir": true, "nodes": children(&keys, "/", recursive) },
            }));
        }
        if let Some(value) = keys.get(key) {
            return ResponseTemplate::new(200).set_body_json(json!({
                "action": "get",
                "node": { "key": key, "value": value },
            }));
        }
        let dir_prefix = format!("{}/", key);
        if keys.keys().any(|k| k.starts_with(&dir_prefix)) {
            return ResponseTemplate::new(200).set_body_json(json!({
                "action": "get",
                "node": { "key": key, "dir": true, "nodes": children(&keys, key, recursive) },
            }));
        }
        Self::not_found(key)
    }

    fn create(&self, key: &str, value: &str) -> ResponseTemplate {
        let mut keys = self.keys.lock().unwrap();
        if keys.contains_key(key) {
            return ResponseTemplate::new(412).set_body_json(json!({
                "errorCode": 105,
                "message": "Key already exists",
                "cause": key,
                "index": 1,
            }));
        }
        keys.insert(key.to_string(), value.to_string());
        ResponseTemplate::new(201).set_body_json(json!({
            "action": "create",
            "node": { "key": key, "value": value },
        }))
    }
}

impl Respond for KeysApi {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let raw = request.url.path().trim_start_matches("/v2/keys");
        let key = format!("/{}", raw.trim_matches('/'));
        let query: BTreeMap<String, String> = request.url.query_pairs().into_owned().collect();

        match request.method.as_str() {
            "GET" => self.get(&key, query.get("recursive").map(String::as_str) == Some("true")),
            "PUT" => {
                let form = form_pairs(&request.body);
                let value = form.get("value").cloned().unwrap_or_default();
                if query.get("prevExist").map(String::as_str) == Some("false") {
                    self.create(&key, &value)
                } else {
                    self.keys.lock().unwrap().insert(key.clone(), value.clone());
                    ResponseTemplate::new(200).set_body_json(json!({
                        "action": "set",
                        "node": { "key": key, "value": value },
                    }))
                }
            }
            _ => ResponseTemplate::new(405),
        }
    }
}

fn form_pairs(body: &[u8]) -> BTreeMap<String, String> {
    let mut url = Url::parse("http://form.invalid/").unwrap();
    url.set_query(Some(&String::from_utf8_lossy(body)));
    url.query_pairs().into_owned().collect()
}

/// Direct children of `dir`, as v2 nodes, nested when `recursive`
fn children(keys: &BTreeMap<String, String>, dir: &str, recursive: bool) -> Vec<Value> {
    let prefix = if dir == "/" { "/".to_string() } else { format!("{}/", dir) };
    let mut names: Vec<String> = Vec::new();

    for key in keys.keys().filter(|k| k.starts_with(&prefix)) {
        let rest = &key[prefix.len()..];
        let name = rest.split('/').next().unwrap_or_default().to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }

    names
        .into_iter()
        .map(|name| {
            let child = format!("{}{}", prefix, name);
            match keys.get(&child) {
                Some(value) => json!({ "key": child, "value": value }),
                None if recursive => json!({
                    "key": child,
                    "dir": true,
                    "nodes": children(keys, &child, true),
                }),
                None => json!({ "key": child, "dir": true }),
            }
        })
        .collect()
}

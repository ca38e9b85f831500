//! End-to-end flows through the public API, driven by a scripted transport.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::{Value, json};
use sodapi::{
    Body, Client, ClientConfig, Error, HttpRequest, HttpResponse, Metadata, Params, Transport,
};

#[derive(Clone, Default)]
struct Script {
    replies: Rc<RefCell<VecDeque<HttpResponse>>>,
    seen: Rc<RefCell<Vec<HttpRequest>>>,
}

impl Script {
    fn reply(&self, status: u16, content_type: &str, body: impl Into<Vec<u8>>) {
        self.replies.borrow_mut().push_back(HttpResponse {
            status,
            reason: match status {
                200 => "OK",
                404 => "Not Found",
                _ => "",
            }
            .to_string(),
            url: String::new(),
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        });
    }

    fn seen(&self) -> Vec<HttpRequest> {
        self.seen.borrow().clone()
    }
}

impl Transport for Script {
    fn get(&self, request: &HttpRequest) -> sodapi::Result<HttpResponse> {
        self.seen.borrow_mut().push(request.clone());
        let mut resp = self
            .replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Transport("script exhausted".into()))?;
        resp.url = request.url.clone();
        Ok(resp)
    }
}

fn client(script: &Script) -> Client<Script> {
    let cfg = ClientConfig::new("data.example.org")
        .app_token("FakeAppToken")
        .scheme("http");
    Client::with_transport(cfg, script.clone()).unwrap()
}

fn bike_counts(range: std::ops::Range<usize>) -> Vec<u8> {
    let rows: Vec<Value> = range
        .map(|i| json!({"id": i.to_string(), "date": "2024-03-01", "counts": "12", "status": "ok"}))
        .collect();
    serde_json::to_vec(&rows).unwrap()
}

#[test]
fn get_all_walks_two_pages() {
    let script = Script::default();
    script.reply(200, "application/json; charset=utf-8", bike_counts(0..1000));
    script.reply(200, "application/json; charset=utf-8", bike_counts(1000..1001));

    let client = client(&script);
    let records: Vec<Value> = client
        .get_all("bike-cnts", &Params::new())
        .unwrap()
        .collect::<sodapi::Result<_>>()
        .unwrap();

    assert_eq!(records.len(), 1001);
    for r in &records {
        let keys: Vec<&str> = r.as_object().unwrap().keys().map(String::as_str).collect();
        for k in ["id", "date", "counts", "status"] {
            assert!(keys.contains(&k));
        }
    }

    let seen = script.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].url, "http://data.example.org/resource/bike-cnts");
    assert!(seen[1].query.contains(&("$offset".to_string(), "1000".to_string())));
}

#[test]
fn take_stops_fetching() {
    let script = Script::default();
    script.reply(200, "application/json", bike_counts(0..10));
    script.reply(200, "application/json", bike_counts(10..20));

    let client = client(&script);
    let first: Vec<Value> = client
        .get_all("bike-cnts", &Params::new().set("limit", 10))
        .unwrap()
        .take(10)
        .map(Result::unwrap)
        .collect();
    assert_eq!(first.len(), 10);
    assert_eq!(script.seen().len(), 1);
}

#[test]
fn csv_page_keeps_header_row() {
    let script = Script::default();
    script.reply(200, "text/csv; charset=utf-8", "name,amount\nA,1\nB,2\nC,3\n");

    let client = client(&script);
    let resp = client
        .get("nimj-3ivp", "csv", &Params::new().set("select", "name, amount"))
        .unwrap();
    assert_eq!(resp.content_type, "text/csv");
    let Body::Rows(rows) = resp.body else {
        panic!("expected CSV rows");
    };
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], ["name", "amount"]);
}

#[test]
fn geojson_is_decoded_as_json() {
    let script = Script::default();
    script.reply(
        200,
        "application/vnd.geo+json",
        r#"{"type":"FeatureCollection","features":[]}"#,
    );
    let client = client(&script);
    let resp = client.get("geo-1234", "json", &Params::new()).unwrap();
    assert_eq!(resp.body.as_json().unwrap()["type"], "FeatureCollection");
}

#[test]
fn not_found_renders_with_url() {
    let script = Script::default();
    script.reply(404, "text/html", "<html>missing</html>");

    let client = client(&script);
    let err = client.get_metadata(Some("gone-0000")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Client Error 404: Not Found for url http://data.example.org/api/views/metadata/v1/gone-0000. See error_detail."
    );
    let Error::Api(api) = err else {
        panic!("expected api error");
    };
    assert!(api.error_detail().is_empty());
}

#[test]
fn catalog_and_metadata() {
    let script = Script::default();
    script.reply(
        200,
        "application/json",
        json!({"results": [], "resultSetSize": 0, "timings": {"serviceMillis": 3}}).to_string(),
    );
    script.reply(
        200,
        "application/json",
        json!({"id": "songs-1234", "name": "Songs"}).to_string(),
    );

    let client = client(&script);
    let catalog = client
        .datasets(&Params::new().set("categories", ["Transportation"]).set("order", "name DESC"))
        .unwrap();
    assert!(catalog["results"].as_array().unwrap().is_empty());

    let Metadata::Dataset(meta) = client.get_metadata(Some("songs-1234")).unwrap() else {
        panic!("expected a single dataset");
    };
    assert_eq!(meta["name"], "Songs");

    let seen = script.seen();
    assert_eq!(
        seen[0].query,
        [
            ("domains".to_string(), "data.example.org".to_string()),
            ("categories".to_string(), "Transportation".to_string()),
            ("order".to_string(), "name DESC".to_string()),
        ]
    );
}

//! Drives the settings, import and block routes the way the admin UI does.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use weather_cities::{CityRepository, SqliteCityStore};
use weather_core::Config;
use weather_server::{routes, AppState};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_upstream() -> MockServer {
    let server = MockServer::start().await;

    let mut catalog = Vec::new();
    for i in 0..12 {
        catalog.push(serde_json::json!({"id": 5000 + i, "name": format!("Springfield {i}"), "country": "US"}));
    }
    catalog.push(serde_json::json!({"id": 703448, "name": "Kyiv", "country": "UA"}));

    Mock::given(method("GET"))
        .and(path("/res/city.list.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Array(catalog)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("id", "5003"))
        .and(query_param("appid", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Springfield 3",
            "main": {"temp": 300.15, "temp_min": 299.15, "temp_max": 301.15, "pressure": 1009, "humidity": 70},
            "weather": [{"description": "light rain", "icon": "10d"}],
            "wind": {"speed": 2.2},
            "sys": {"sunrise": 0, "sunset": 43200}
        })))
        .mount(&server)
        .await;

    server
}

fn state_for(server: &MockServer, config_path: std::path::PathBuf) -> AppState {
    let mut config = Config::default();
    config.weather.key = "k".into();
    config.weather.api_url = format!("{}/data/2.5/weather", server.uri());
    config.catalog.url = format!("{}/res/city.list.json", server.uri());

    AppState::new(
        config,
        Some(config_path),
        SqliteCityStore::in_memory().unwrap(),
        reqwest::Client::new(),
    )
}

#[tokio::test]
async fn import_then_render_block() {
    let upstream = mock_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let state = state_for(&upstream, config_path.clone());
    let routes = routes(state.clone());

    // Start the import for the US
    let resp = warp::test::request()
        .method("POST")
        .path("/admin/weather/cities/import")
        .header("content-type", "application/x-www-form-urlencoded")
        .body("country=US")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 200);
    let started: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(started["title"], "Updating weather cities database...");
    assert_eq!(state.config().weather.country, "US");

    // Feed the job back until it reports finished
    let mut job = started["job"].clone();
    let mut steps = 0;
    let last = loop {
        let resp = warp::test::request()
            .method("POST")
            .path("/admin/weather/cities/import/step")
            .json(&job)
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 200);
        let reply: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        steps += 1;
        if reply["finished"] == true {
            break reply;
        }
        assert!(reply["progress"].as_f64().unwrap() < 1.0);
        job = reply["job"].clone();
    };

    assert_eq!(steps, 2);
    assert_eq!(last["progress"], 1.0);
    assert_eq!(last["message"], "12 cities processed.");
    assert_eq!(state.store.lock().count().unwrap(), 12);

    // Configure a block and render it
    let resp = warp::test::request()
        .method("POST")
        .path("/block/front/config")
        .header("content-type", "application/x-www-form-urlencoded")
        .body("city=5003&scale=C")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 200);

    let resp = warp::test::request()
        .path("/block/front")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["cache-control"], "no-store, max-age=0");
    let html = String::from_utf8(resp.body().to_vec()).unwrap();
    assert!(html.contains("Springfield 3"));
    assert!(html.contains("27&#8451;"));
    assert!(html.contains("Sunset: 12:00:00"));

    // Settings changes were persisted
    let saved = Config::load_from(&config_path).unwrap();
    assert_eq!(saved.weather.country, "US");
    assert_eq!(saved.block("front").city, "5003");
}

#[tokio::test]
async fn autocomplete_after_import() {
    let upstream = mock_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let state = state_for(&upstream, dir.path().join("config.toml"));
    let routes = routes(state.clone());

    {
        let store = state.store.lock();
        store.insert(703448, "Kyiv", "UA").unwrap();
    }

    let resp = warp::test::request()
        .path("/weather/autocomplete?q=Ky")
        .reply(&routes)
        .await;
    let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body[0]["label"], "Kyiv (UA)");
    assert_eq!(body[0]["value"], "703448");
}

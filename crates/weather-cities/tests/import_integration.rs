//! End-to-end import runs against a mock catalog server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use weather_cities::{
    CityCatalogFetcher, CityRepository, ImportJob, ImportState, SqliteCityStore,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog_json() -> serde_json::Value {
    let mut entries = Vec::new();
    for i in 0..23 {
        entries.push(serde_json::json!({"id": 700000 + i, "name": format!("Misto {i}"), "country": "UA"}));
        entries.push(serde_json::json!({"id": 500000 + i, "name": format!("Town {i}"), "country": "US"}));
    }
    serde_json::Value::Array(entries)
}

async fn catalog_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/res/city.list.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .mount(&server)
        .await;
    server
}

fn fetcher_for(server: &MockServer) -> CityCatalogFetcher {
    CityCatalogFetcher::new(
        reqwest::Client::new(),
        format!("{}/res/city.list.json", server.uri()),
    )
}

#[tokio::test]
async fn import_inserts_only_configured_country() {
    let server = catalog_server().await;
    let fetcher = fetcher_for(&server);
    let store = SqliteCityStore::in_memory().unwrap();

    let mut job = ImportJob::new("US");
    job.run_to_completion(&fetcher, &store).await.unwrap();

    assert_eq!(job.state, ImportState::Complete);
    assert_eq!(job.progress.processed_count, 23);
    assert_eq!(job.progress.total_count, 23);
    assert_eq!(job.progress.inserted_count, 23);
    assert_eq!(store.count().unwrap(), 23);
    assert!(store.exists(500000).unwrap());
    assert!(!store.exists(700000).unwrap());
    assert_eq!(job.finish_message(), "23 cities processed.");
}

#[tokio::test]
async fn import_runs_in_chunks_of_ten() {
    let server = catalog_server().await;
    let fetcher = fetcher_for(&server);
    let store = SqliteCityStore::in_memory().unwrap();

    let mut job = ImportJob::new("UA");
    let mut steps = 0;
    while !job.is_finished() {
        job.step(&fetcher, &store).await.unwrap();
        steps += 1;
    }

    assert_eq!(steps, 3);
    assert_eq!(job.results.first().map(String::as_str), Some("Misto 0"));
    assert_eq!(job.message.as_deref(), Some("Misto 22"));
}

#[tokio::test]
async fn reimport_inserts_nothing() {
    let server = catalog_server().await;
    let fetcher = fetcher_for(&server);
    let store = SqliteCityStore::in_memory().unwrap();

    ImportJob::new("UA")
        .run_to_completion(&fetcher, &store)
        .await
        .unwrap();

    let mut second = ImportJob::new("UA");
    second.run_to_completion(&fetcher, &store).await.unwrap();

    assert_eq!(second.progress.processed_count, 23);
    assert_eq!(second.progress.inserted_count, 0);
    assert_eq!(store.count().unwrap(), 23);
}

#[tokio::test]
async fn unreachable_catalog_finishes_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = SqliteCityStore::in_memory().unwrap();
    let mut job = ImportJob::new("UA");
    job.run_to_completion(&fetcher_for(&server), &store)
        .await
        .unwrap();

    assert!(matches!(job.state, ImportState::Failed { .. }));
    assert_eq!(job.finish_message(), "Finished with an error.");
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn country_without_cities_completes_immediately() {
    let server = catalog_server().await;
    let store = SqliteCityStore::in_memory().unwrap();

    let mut job = ImportJob::new("DE");
    job.step(&fetcher_for(&server), &store).await.unwrap();

    assert!(job.is_finished());
    assert_eq!(job.progress(), 1.0);
    assert_eq!(job.finish_message(), "0 cities processed.");
}

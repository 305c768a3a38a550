use std::sync::Arc;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use reef_tracker::{routes, SqliteStore};

#[derive(Debug, Deserialize)]
struct Tank {
    id: i64,
    name: String,
    size_gallons: f64,
}

#[derive(Debug, Deserialize)]
struct ParameterRecord {
    tank_id: i64,
    date: String,
    alk: Option<f64>,
    po4: Option<f64>,
    water_change_gallons: Option<f64>,
    notes: Option<String>,
}

/// Serve the router over a fresh in-memory database on an ephemeral port.
async fn spawn_app() -> Result<String> {
    // ---
    let store = SqliteStore::connect("sqlite::memory:", 1).await?;
    store.create_schema().await?;
    let app = routes::router(Arc::new(store));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok(format!("http://{addr}"))
}

async fn create_tank(client: &Client, base: &str, name: &str, size: f64) -> Result<Tank> {
    // ---
    let response = client
        .post(format!("{base}/api/tanks"))
        .json(&json!({ "name": name, "size_gallons": size }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(response.json().await?)
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let response = Client::new().get(format!("{base}/health")).send().await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tanks"], 0);

    Ok(())
}

#[tokio::test]
async fn tank_lifecycle() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let display = create_tank(&client, &base, "Display", 75.0).await?;
    assert_eq!(display.name, "Display");
    assert_eq!(display.size_gallons, 75.0);

    // Duplicate name is a conflict and does not add a tank
    let duplicate = client
        .post(format!("{base}/api/tanks"))
        .json(&json!({ "name": "Display", "size_gallons": 20.0 }))
        .send()
        .await?;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    let body: Value = duplicate.json().await?;
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    let invalid = client
        .post(format!("{base}/api/tanks"))
        .json(&json!({ "name": "", "size_gallons": 20.0 }))
        .send()
        .await?;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let tanks: Vec<Tank> = client
        .get(format!("{base}/api/tanks"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tanks.len(), 1);

    let updated: Tank = client
        .put(format!("{base}/api/tanks/{}", display.id))
        .json(&json!({ "size_gallons": 90.0 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(updated.name, "Display");
    assert_eq!(updated.size_gallons, 90.0);

    let deleted = client
        .delete(format!("{base}/api/tanks/{}", display.id))
        .send()
        .await?;
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = client
        .get(format!("{base}/api/tanks/{}", display.id))
        .send()
        .await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let missing_update = client
        .put(format!("{base}/api/tanks/{}", display.id))
        .json(&json!({ "name": "Renamed" }))
        .send()
        .await?;
    assert_eq!(missing_update.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn parameter_upsert_replaces_and_deletes() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let tank = create_tank(&client, &base, "Display", 75.0).await?;

    for body in [
        json!({ "tank_id": tank.id, "date": "2025-03-01", "alk": 8.1, "notes": "first" }),
        json!({ "tank_id": tank.id, "date": "2025-03-01", "po4": 0.03 }),
        json!({ "tank_id": tank.id, "date": "2025-02-15", "water_change_gallons": 10.0 }),
    ] {
        let response = client
            .post(format!("{base}/api/parameters"))
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let records: Vec<ParameterRecord> = client
        .get(format!("{base}/api/parameters?tank_id={}", tank.id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].date, "2025-02-15");
    assert_eq!(records[0].water_change_gallons, Some(10.0));
    assert_eq!(records[1].tank_id, tank.id);
    assert_eq!(records[1].po4, Some(0.03));
    assert_eq!(records[1].alk, None);
    assert_eq!(records[1].notes, None);

    let all: Vec<Value> = client
        .get(format!("{base}/api/parameters"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["tank_name"], "Display");

    let bad_date = client
        .post(format!("{base}/api/parameters"))
        .json(&json!({ "tank_id": tank.id, "date": "March 1st" }))
        .send()
        .await?;
    assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);

    let orphan = client
        .post(format!("{base}/api/parameters"))
        .json(&json!({ "tank_id": tank.id + 50, "date": "2025-03-01" }))
        .send()
        .await?;
    assert_eq!(orphan.status(), StatusCode::NOT_FOUND);

    let missing = client
        .delete(format!("{base}/api/parameters/{}/2025-04-01", tank.id))
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let removed = client
        .delete(format!("{base}/api/parameters/{}/2025-03-01", tank.id))
        .send()
        .await?;
    assert_eq!(removed.status(), StatusCode::OK);

    let lookup = client
        .get(format!("{base}/api/parameters/{}/2025-03-01", tank.id))
        .send()
        .await?;
    assert_eq!(lookup.status(), StatusCode::NOT_FOUND);

    let cleared: Value = client
        .delete(format!("{base}/api/parameters/clear?tank_id={}", tank.id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(cleared["deleted"], 1);

    let cleared_again: Value = client
        .delete(format!("{base}/api/parameters/clear?tank_id={}", tank.id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(cleared_again["success"], true);
    assert_eq!(cleared_again["deleted"], 0);

    Ok(())
}

#[tokio::test]
async fn deleting_tank_removes_its_history() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let tank = create_tank(&client, &base, "Frag", 40.0).await?;

    for day in 1..=5 {
        client
            .post(format!("{base}/api/parameters"))
            .json(&json!({ "tank_id": tank.id, "date": format!("2025-01-0{day}"), "alk": 8.0 }))
            .send()
            .await?
            .error_for_status()?;
    }

    client
        .delete(format!("{base}/api/tanks/{}", tank.id))
        .send()
        .await?
        .error_for_status()?;

    let listed = client
        .get(format!("{base}/api/parameters?tank_id={}", tank.id))
        .send()
        .await?;
    assert_eq!(listed.status(), StatusCode::NOT_FOUND);

    let all: Vec<Value> = client
        .get(format!("{base}/api/parameters"))
        .send()
        .await?
        .json()
        .await?;
    assert!(all.is_empty());

    Ok(())
}

#[tokio::test]
async fn water_change_monthly_summary() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let tank = create_tank(&client, &base, "Display", 75.0).await?;

    // Day -5 and day -40 relative to 2025-06-15
    for (date, gallons) in [("2025-06-10", 15.0), ("2025-05-06", 20.0)] {
        client
            .post(format!("{base}/api/parameters"))
            .json(&json!({ "tank_id": tank.id, "date": date, "water_change_gallons": gallons }))
            .send()
            .await?
            .error_for_status()?;
    }

    let summary: Value = client
        .get(format!(
            "{base}/api/analytics/water-change-monthly?tank_id={}&as_of=2025-06-15",
            tank.id
        ))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(summary["tank_size"], 75.0);
    assert_eq!(summary["last_30_days"]["gallons"], 15.0);
    assert_eq!(summary["last_30_days"]["percentage"], 20.0);
    assert_eq!(summary["monthly_history"].as_array().unwrap().len(), 2);
    assert_eq!(summary["monthly_history"][0]["month"], "2025-06");

    let missing_tank = client
        .get(format!("{base}/api/analytics/water-change-monthly"))
        .send()
        .await?;
    assert_eq!(missing_tank.status(), StatusCode::BAD_REQUEST);

    let unknown = client
        .get(format!(
            "{base}/api/analytics/water-change-monthly?tank_id={}",
            tank.id + 1
        ))
        .send()
        .await?;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn malformed_input_is_rejected_as_json() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let tank = create_tank(&client, &base, "Display", 75.0).await?;

    let requests = [
        client
            .post(format!("{base}/api/tanks"))
            .json(&json!({ "name": "Display" })),
        client
            .post(format!("{base}/api/parameters"))
            .json(&json!({ "tank_id": tank.id })),
        client
            .post(format!("{base}/api/parameters"))
            .header("content-type", "application/json")
            .body("{not json"),
        client.get(format!("{base}/api/parameters?tank_id=abc")),
        client.get(format!("{base}/api/tanks/abc")),
        client.get(format!(
            "{base}/api/analytics/water-change-monthly?tank_id={}&as_of=%2B202-03-26",
            tank.id
        )),
    ];

    for request in requests {
        let response = request.send().await?;
        let url = response.url().clone();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{url}");

        let body: Value = response.json().await?;
        assert!(body["error"].is_string(), "{url}: {body}");
    }

    // Nothing was written by the rejected upserts
    let records: Vec<ParameterRecord> = client
        .get(format!("{base}/api/parameters?tank_id={}", tank.id))
        .send()
        .await?
        .json()
        .await?;
    assert!(records.is_empty());

    Ok(())
}

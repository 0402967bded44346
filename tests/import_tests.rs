use assert_fs::prelude::*;
use predicates::prelude::*;
use std::collections::HashMap;
use tokio::task;
use warp::Filter;

#[tokio::test]
async fn import_follows_airtable_offset_pages() {
    let page1 = serde_json::json!({
        "records": [
            {
                "id": "rec1",
                "createdTime": "2024-03-25T09:00:00.000Z",
                "fields": {
                    "Name": "Login page",
                    "Type": "Story",
                    "Status": "Done",
                    "createdAt": "2024-03-25T09:00:00.000Z",
                    "toInProgress": "2024-03-30T09:00:00.000Z",
                    "toDone": "2024-04-01T10:00:00.000Z",
                    "Points": 3
                }
            }
        ],
        "offset": "itrNext"
    });
    let page2 = serde_json::json!({
        "records": [
            {
                "id": "rec2",
                "createdTime": "2024-03-26T09:00:00.000Z",
                "fields": {
                    "Name": "Password reset",
                    "Type": "Story",
                    "Status": "Done",
                    "createdAt": "2024-03-26T09:00:00.000Z",
                    "toDone": "2024-04-02T15:00:00.000Z",
                    "Points": 5
                }
            }
        ]
    });

    let records_route = warp::path!("v0" / "appBoard" / "Tasks")
        .and(warp::get())
        .and(warp::header::<String>("authorization"))
        .and(warp::query::<HashMap<String, String>>())
        .map(move |authorization: String, query: HashMap<String, String>| {
            assert_eq!(authorization, "Bearer mock-key");
            if query.get("offset").map(|value| value.as_str()) == Some("itrNext") {
                warp::reply::json(&page2)
            } else {
                warp::reply::json(&page1)
            }
        });
    let (addr, server) = warp::serve(records_route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let dir = assert_fs::TempDir::new().unwrap();
    let dataset = dir.child("imported.json");
    let dataset_arg = dataset.path().to_str().unwrap().to_string();
    let api_url = format!("http://{addr}/v0");

    task::spawn_blocking(move || {
        let mut cmd = assert_cmd::cargo_bin_cmd!("flow-analyzer");
        cmd.env("AIRTABLE_API_URL", &api_url)
            .env("AIRTABLE_API_KEY", "mock-key")
            .env("AIRTABLE_BASE", "appBoard")
            .env("AIRTABLE_TABLE", "Tasks")
            .args(["import", "-s", "airtable", "-o", &dataset_arg]);

        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Imported 2 records to"));

        let mut cycle_time = assert_cmd::cargo_bin_cmd!("flow-analyzer");
        cycle_time.args(["cycle-time", "-d", &dataset_arg, "--today", "2024-04-10"]);
        cycle_time
            .assert()
            .success()
            .stdout(predicate::str::contains("Tasks: 2"));
    })
    .await
    .unwrap();

    dataset.assert(predicate::str::contains("Password reset"));
    dataset.assert(predicate::str::contains("rec1").not());
}

#[tokio::test]
async fn import_reports_rejected_credentials() {
    let records_route = warp::path!("v0" / "appBoard" / "Tasks").map(|| {
        warp::reply::with_status(
            warp::reply::json(&serde_json::json!({"error": "AUTHENTICATION_REQUIRED"})),
            warp::http::StatusCode::UNAUTHORIZED,
        )
    });
    let (addr, server) = warp::serve(records_route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let dir = assert_fs::TempDir::new().unwrap();
    let dataset_arg = dir.child("imported.json").path().to_str().unwrap().to_string();
    let api_url = format!("http://{addr}/v0");

    task::spawn_blocking(move || {
        let mut cmd = assert_cmd::cargo_bin_cmd!("flow-analyzer");
        cmd.env("AIRTABLE_API_URL", &api_url)
            .env("AIRTABLE_API_KEY", "wrong-key")
            .env("AIRTABLE_BASE", "appBoard")
            .env("AIRTABLE_TABLE", "Tasks")
            .args(["import", "-o", &dataset_arg]);

        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("unauthorized"));
    })
    .await
    .unwrap();
}

#[test]
fn import_requires_airtable_credentials() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("flow-analyzer");
    cmd.env_remove("AIRTABLE_API_KEY")
        .env("AIRTABLE_BASE", "appBoard")
        .env("AIRTABLE_TABLE", "Tasks")
        .args(["import", "-o", "unused.json"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing environment variable AIRTABLE_API_KEY"));
}

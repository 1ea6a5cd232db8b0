mod common;

#[tokio::test]
async fn health_check_reports_database_and_migrations() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Response should be JSON");
    assert_eq!("healthy", body["components"]["database"]["status"]);
    assert!(body["components"].get("migrations").is_some());
}

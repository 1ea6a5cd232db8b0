mod common;

use jdma_forms::forms::TemplateImport;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn publish(app: &common::TestApp, token: Option<String>, payload: Value) -> reqwest::Response {
    publish_to(app, app.template.id, token, payload).await
}

async fn publish_to(
    app: &common::TestApp,
    template_id: i32,
    token: Option<String>,
    payload: Value,
) -> reqwest::Response {
    let mut request = reqwest::Client::new()
        .post(format!("{}/admin/form/{}/config", app.address, template_id))
        .json(&payload);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    request.send().await.expect("Failed to execute request.")
}

#[tokio::test]
async fn publishing_appends_versions_with_validity_windows() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    let bad = app.option("satisfaction", "Mauvaise").id;
    let details = app.block("verbatim").id;

    let first = publish(
        &app,
        Some(app.admin_token()),
        json!({
            "product_id": app.product_id,
            "displays": [{"kind": "blockOption", "parent_id": bad, "hidden": true}]
        }),
    )
    .await;
    assert_eq!(StatusCode::OK, first.status());
    let first: Value = first.json().await.unwrap();
    assert_eq!(1, first["item"]["version"]);

    let second = publish(
        &app,
        Some(app.admin_token()),
        json!({
            "product_id": app.product_id,
            "displays": [{"kind": "block", "parent_id": details, "hidden": true}]
        }),
    )
    .await;
    let second: Value = second.json().await.unwrap();
    assert_eq!(2, second["item"]["version"]);

    let response = reqwest::Client::new()
        .get(format!(
            "{}/admin/form/{}/config?product_id={}",
            app.address, app.template.id, app.product_id
        ))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, response.status());

    let body: Value = response.json().await.unwrap();
    let versions = body["list"].as_array().unwrap();
    assert_eq!(
        vec![0, 1, 2],
        versions.iter().map(|v| v["version"].as_i64().unwrap()).collect::<Vec<_>>()
    );
    assert_eq!(versions[1]["valid_from"], versions[0]["valid_until"]);
    assert_eq!(versions[2]["valid_from"], versions[1]["valid_until"]);
    assert!(versions[2]["valid_until"].is_null());

    let stored = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM form_config WHERE product_id = $1")
        .bind(app.product_id)
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(2, stored);
}

#[tokio::test]
async fn override_of_a_foreign_block_is_rejected() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };

    let response = publish(
        &app,
        Some(app.admin_token()),
        json!({
            "product_id": app.product_id,
            "displays": [{"kind": "block", "parent_id": 999999, "hidden": true}]
        }),
    )
    .await;

    assert_eq!(StatusCode::NOT_FOUND, response.status());
}

#[tokio::test]
async fn publishing_requires_an_admin_role() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    let payload = json!({"product_id": app.product_id, "displays": []});

    let response = publish(&app, Some(app.token("respondent")), payload.clone()).await;
    assert_eq!(StatusCode::FORBIDDEN, response.status());

    let response = publish(&app, None, payload.clone()).await;
    assert_eq!(StatusCode::FORBIDDEN, response.status());

    let response = publish(&app, Some("not.a.token".to_string()), payload).await;
    assert_eq!(StatusCode::UNAUTHORIZED, response.status());
}

#[tokio::test]
async fn modified_steps_flag_the_step_holding_an_override() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    let good = app.option("satisfaction", "Bonne").id;

    let response = reqwest::Client::new()
        .post(format!(
            "{}/admin/form/{}/modified-steps?product_id={}",
            app.address, app.template.id, app.product_id
        ))
        .bearer_auth(app.admin_token())
        .json(&json!({
            "displays": [{"kind": "blockOption", "parent_id": good, "hidden": true}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::OK, response.status());

    let body: Value = response.json().await.unwrap();
    let first_step = app.template.steps[0].id.to_string();
    let second_step = app.template.steps[1].id.to_string();
    assert_eq!(true, body["item"][&first_step]);
    assert_eq!(false, body["item"][&second_step]);
}

#[tokio::test]
async fn product_without_form_only_configures_the_root_template() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    let import: TemplateImport =
        serde_yaml::from_str(&common::SEED_TEMPLATE.replace("slug: root", "slug: custom")).unwrap();
    let custom = jdma_forms::db::form_template::insert_template(&app.db_pool, import.into_template())
        .await
        .unwrap();
    let custom_block = custom.steps[1].blocks[0].id;

    let response = publish_to(
        &app,
        custom.id,
        Some(app.admin_token()),
        json!({
            "product_id": app.product_id,
            "displays": [{"kind": "block", "parent_id": custom_block, "hidden": true}]
        }),
    )
    .await;
    assert_eq!(StatusCode::NOT_FOUND, response.status());

    let response = reqwest::Client::new()
        .get(format!(
            "{}/form/{}/effective?product_id={}",
            app.address, custom.id, app.product_id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::NOT_FOUND, response.status());

    let stored = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM form_config WHERE product_id = $1")
        .bind(app.product_id)
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(0, stored);

    let response = publish(
        &app,
        Some(app.admin_token()),
        json!({
            "product_id": app.product_id,
            "displays": [{"kind": "block", "parent_id": app.block("verbatim").id, "hidden": true}]
        }),
    )
    .await;
    assert_eq!(StatusCode::OK, response.status());
    let body: Value = response.json().await.unwrap();
    assert_eq!(1, body["item"]["version"]);
}

#[tokio::test]
async fn concurrent_publishes_never_share_a_version() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    let client = reqwest::Client::new();
    let url = format!("{}/admin/form/{}/config", app.address, app.template.id);
    let payload = json!({
        "product_id": app.product_id,
        "displays": [{"kind": "block", "parent_id": app.block("verbatim").id, "hidden": true}]
    });

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let request = client
                .post(&url)
                .bearer_auth(app.admin_token())
                .json(&payload);
            tokio::spawn(async move { request.send().await })
        })
        .collect();

    let mut versions = vec![];
    for handle in handles {
        let response = handle.await.unwrap().expect("Failed to execute request.");
        match response.status() {
            StatusCode::OK => {
                let body: Value = response.json().await.unwrap();
                versions.push(body["item"]["version"].as_i64().unwrap());
            }
            StatusCode::CONFLICT => {}
            other => panic!("unexpected status {}", other),
        }
    }
    assert!(!versions.is_empty());

    versions.sort();
    let expected: Vec<i64> = (1..=versions.len() as i64).collect();
    assert_eq!(expected, versions);

    let (rows, distinct) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(DISTINCT version) FROM form_config WHERE product_id = $1",
    )
    .bind(app.product_id)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(versions.len() as i64, rows);
    assert_eq!(rows, distinct);
}

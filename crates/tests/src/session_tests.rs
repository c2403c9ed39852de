use bson::oid::ObjectId;
use serde_json::Value;

use crate::fixtures::test_app::TestApp;

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn create_and_fetch_session() {
    let app = TestApp::spawn().await;
    let user_id = ObjectId::new().to_hex();

    let resp = app
        .client
        .post(app.url("/api/session"))
        .json(&serde_json::json!({
            "user_id": user_id,
            "summary": "Kim family intake",
            "audio_key": "recordings/intake.webm",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    let resp = app
        .client
        .get(app.url(&format!("/api/session/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let session: Value = resp.json().await.unwrap();
    assert_eq!(session["id"], id);
    assert_eq!(session["user_id"], user_id);
    assert_eq!(session["summary"], "Kim family intake");
    assert_eq!(session["status"], "uploaded");
    assert!(session["is_valid"].is_null());
    assert!(session["scores"].is_null());
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn list_sessions_is_scoped_to_user() {
    let app = TestApp::spawn().await;
    let user_a = ObjectId::new().to_hex();
    let user_b = ObjectId::new().to_hex();

    for (user, key) in [(&user_a, "a.webm"), (&user_a, "b.webm"), (&user_b, "c.webm")] {
        let resp = app
            .client
            .post(app.url("/api/session"))
            .json(&serde_json::json!({ "user_id": user, "audio_key": key }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    let resp = app
        .client
        .get(app.url(&format!("/api/session?user_id={user_a}")))
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn unknown_session_is_a_404() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url(&format!("/api/session/{}", ObjectId::new().to_hex())))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn malformed_session_id_is_a_400() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/api/session/not-an-object-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

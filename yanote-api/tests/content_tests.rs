//! What the note pages show to whom.

use axum::http::StatusCode;

#[path = "support/app.rs"]
mod test_app_support;
use test_app_support::{body_json, TestApp};

#[tokio::test]
async fn test_notes_list_for_different_users() -> Result<(), String> {
    let app = TestApp::new().await?;

    let cases = [(&app.author, true), (&app.reader, false)];
    for (user, note_in_list) in cases {
        let cookie = app.force_login(user)?;
        let response = app.get("/notes/", Some(&cookie)).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await?;
        let notes = body["object_list"]
            .as_array()
            .ok_or_else(|| "object_list is not an array".to_string())?;
        let found = notes.iter().any(|n| n["slug"] == app.note.slug.as_str());
        assert_eq!(found, note_in_list, "user {}", user.username);
    }
    Ok(())
}

#[tokio::test]
async fn test_pages_contain_form() -> Result<(), String> {
    let app = TestApp::new().await?;
    let cookie = app.force_login(&app.author)?;

    let edit_path = format!("/edit/{}/", app.note.slug);
    for path in ["/add/", edit_path.as_str()] {
        let response = app.get(path, Some(&cookie)).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await?;
        let form = &body["form"];
        assert!(form.is_object(), "{} has no form", path);
        for field in ["title", "text", "slug", "errors"] {
            assert!(!form[field].is_null(), "{} form lacks {}", path, field);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_edit_form_is_prefilled() -> Result<(), String> {
    let app = TestApp::new().await?;
    let cookie = app.force_login(&app.author)?;

    let response = app
        .get(&format!("/edit/{}/", app.note.slug), Some(&cookie))
        .await?;
    let body = body_json(response).await?;
    assert_eq!(body["form"]["title"], app.note.title.as_str());
    assert_eq!(body["form"]["text"], app.note.text.as_str());
    assert_eq!(body["form"]["slug"], app.note.slug.as_str());
    Ok(())
}

#[tokio::test]
async fn test_note_detail_shows_note() -> Result<(), String> {
    let app = TestApp::new().await?;
    let cookie = app.force_login(&app.author)?;

    let response = app
        .get(&format!("/note/{}/", app.note.slug), Some(&cookie))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["note"]["title"], app.note.title.as_str());
    assert_eq!(body["note"]["text"], app.note.text.as_str());
    assert_eq!(body["note"]["slug"], app.note.slug.as_str());
    Ok(())
}

#[tokio::test]
async fn test_home_greets_logged_in_user() -> Result<(), String> {
    let app = TestApp::new().await?;

    let response = app.get("/", None).await?;
    let body = body_json(response).await?;
    assert!(body.get("username").is_none());

    let cookie = app.force_login(&app.author)?;
    let response = app.get("/", Some(&cookie)).await?;
    let body = body_json(response).await?;
    assert_eq!(body["username"], app.author.username.as_str());
    Ok(())
}

//! End-to-end HTTP tests against the router backed by an in-memory database.

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_permission, create_role, send, setup_test_db, test_app};

#[tokio::test]
async fn test_create_member_with_role_and_permissions() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(db);

    let (status, view, _) = send(&app, "POST", "/api/permissions", Some(json!({"name": "view"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, edit, _) = send(&app, "POST", "/api/permissions", Some(json!({"name": "edit"}))).await;

    let (status, role, headers) = send(
        &app,
        "POST",
        "/api/roles",
        Some(json!({
            "name": "Dev",
            "is_admin": false,
            "permission_ids": [view["id"], edit["id"]],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        headers["location"],
        format!("/api/roles/{}", role["id"]).as_str()
    );

    let (status, member, headers) = send(
        &app,
        "POST",
        "/api/team-members",
        Some(json!({
            "first_name": "Jane",
            "last_name": "Smith",
            "email": "jane@x.com",
            "phone_number": "(555) 123-4567",
            "role_id": role["id"],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let location = format!("/api/team-members/{}", member["id"]);
    assert_eq!(headers["location"], location.as_str());
    assert_eq!(member["first_name"], "Jane");
    assert_eq!(member["role"]["name"], "Dev");
    let names: Vec<&str> = member["role"]["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["edit", "view"]);

    let (status, fetched, _) = send(&app, "GET", &location, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, member);

    Ok(())
}

#[tokio::test]
async fn test_bad_phone_number_is_rejected_with_field_details() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(db);

    let (status, body, headers) = send(
        &app,
        "POST",
        "/api/team-members",
        Some(json!({
            "first_name": "Jane",
            "last_name": "Smith",
            "email": "jane@x.com",
            "phone_number": "555-123-4567",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers["content-type"], "application/problem+json");
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(
        body["details"]["phone_number"][0],
        "phone_number must match (XXX) XXX-XXXX"
    );
    assert!(body["details"]["email"].is_null());

    let (_, list, _) = send(&app, "GET", "/api/team-members", None).await;
    assert_eq!(list, json!([]));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(db);
    let payload = json!({
        "first_name": "Jane",
        "last_name": "Smith",
        "email": "jane@x.com",
        "phone_number": "(555) 123-4567",
    });

    let (status, _, _) = send(&app, "POST", "/api/team-members", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body, _) = send(&app, "POST", "/api/team-members", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["details"]["field"], "email");

    Ok(())
}

#[tokio::test]
async fn test_unknown_role_is_not_found() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(db);

    let (status, body, _) = send(
        &app,
        "POST",
        "/api/team-members",
        Some(json!({
            "first_name": "Jane",
            "last_name": "Smith",
            "email": "jane@x.com",
            "phone_number": "(555) 123-4567",
            "role_id": 404,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"]["resource"], "role");
    assert_eq!(body["details"]["field"], "role_id");
    assert_eq!(body["details"]["ids"], json!([404]));

    Ok(())
}

#[tokio::test]
async fn test_role_with_unknown_permissions_lists_all_missing_ids() -> Result<()> {
    let db = setup_test_db().await?;
    let view = create_permission(&db, "view").await;
    let app = test_app(db);

    let (status, body, _) = send(
        &app,
        "POST",
        "/api/roles",
        Some(json!({"name": "Dev", "permission_ids": [view.id, 51, 50]})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"]["ids"], json!([50, 51]));

    Ok(())
}

#[tokio::test]
async fn test_patch_null_role_clears_assignment() -> Result<()> {
    let db = setup_test_db().await?;
    let role = create_role(&db, "Dev", false, vec![]).await;
    let app = test_app(db);

    let (_, member, _) = send(
        &app,
        "POST",
        "/api/team-members",
        Some(json!({
            "first_name": "Jane",
            "last_name": "Smith",
            "email": "jane@x.com",
            "phone_number": "(555) 123-4567",
            "role_id": role.role.id,
        })),
    )
    .await;
    let uri = format!("/api/team-members/{}", member["id"]);

    // Absent role_id keeps the role.
    let (status, body, _) = send(&app, "PATCH", &uri, Some(json!({"last_name": "Doe"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_name"], "Doe");
    assert_eq!(body["role"]["name"], "Dev");

    let (status, body, _) = send(&app, "PATCH", &uri, Some(json!({"role_id": null}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["role"].is_null());
    assert_eq!(body["first_name"], "Jane");

    Ok(())
}

#[tokio::test]
async fn test_put_requires_every_field() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(db);

    let (_, member, _) = send(
        &app,
        "POST",
        "/api/team-members",
        Some(json!({
            "first_name": "Jane",
            "last_name": "Smith",
            "email": "jane@x.com",
            "phone_number": "(555) 123-4567",
        })),
    )
    .await;
    let uri = format!("/api/team-members/{}", member["id"]);

    let (status, body, _) = send(&app, "PUT", &uri, Some(json!({"first_name": "Janet"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["last_name", "email", "phone_number"] {
        assert!(body["details"][field].is_array(), "{field} should be reported");
    }

    let (status, body, _) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({
            "first_name": "Janet",
            "last_name": "Smith",
            "email": "janet@x.com",
            "phone_number": "(555) 765-4321",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "janet@x.com");

    Ok(())
}

#[tokio::test]
async fn test_delete_member_then_not_found() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(db);

    let (_, member, _) = send(
        &app,
        "POST",
        "/api/team-members",
        Some(json!({
            "first_name": "Jane",
            "last_name": "Smith",
            "email": "jane@x.com",
            "phone_number": "(555) 123-4567",
        })),
    )
    .await;
    let uri = format!("/api/team-members/{}", member["id"]);

    let (status, body, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_deleting_role_keeps_members() -> Result<()> {
    let db = setup_test_db().await?;
    let role = create_role(&db, "Dev", false, vec![]).await;
    let app = test_app(db);

    let (_, member, _) = send(
        &app,
        "POST",
        "/api/team-members",
        Some(json!({
            "first_name": "Jane",
            "last_name": "Smith",
            "email": "jane@x.com",
            "phone_number": "(555) 123-4567",
            "role_id": role.role.id,
        })),
    )
    .await;

    let (status, _, _) = send(&app, "DELETE", &format!("/api/roles/{}", role.role.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body, _) = send(
        &app,
        "GET",
        &format!("/api/team-members/{}", member["id"]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["role"].is_null());

    Ok(())
}

#[tokio::test]
async fn test_deleting_permission_updates_role() -> Result<()> {
    let db = setup_test_db().await?;
    let view = create_permission(&db, "view").await;
    let edit = create_permission(&db, "edit").await;
    let role = create_role(&db, "Dev", false, vec![view.id, edit.id]).await;
    let app = test_app(db);

    let (status, _, _) = send(&app, "DELETE", &format!("/api/permissions/{}", view.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body, _) = send(&app, "GET", &format!("/api/roles/{}", role.role.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permissions"].as_array().unwrap().len(), 1);
    assert_eq!(body["permissions"][0]["name"], "edit");

    Ok(())
}

#[tokio::test]
async fn test_role_patch_replaces_permission_set() -> Result<()> {
    let db = setup_test_db().await?;
    let p1 = create_permission(&db, "p1").await;
    let p2 = create_permission(&db, "p2").await;
    let p3 = create_permission(&db, "p3").await;
    let role = create_role(&db, "Dev", false, vec![p1.id, p2.id]).await;
    let app = test_app(db);

    let (status, body, _) = send(
        &app,
        "PATCH",
        &format!("/api/roles/{}", role.role.id),
        Some(json!({"permission_ids": [p3.id]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Dev");
    assert_eq!(body["permissions"], json!([{
        "id": p3.id,
        "name": "p3",
        "created_at": body["permissions"][0]["created_at"],
        "updated_at": body["permissions"][0]["updated_at"],
    }]));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_permission_name_is_conflict() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(db);

    let (status, _, _) = send(&app, "POST", "/api/permissions", Some(json!({"name": "view"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body, _) =
        send(&app, "POST", "/api/permissions", Some(json!({"name": " view "}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["value"], "view");

    let (status, body, _) = send(&app, "POST", "/api/permissions", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["name"][0], "name is required");

    Ok(())
}

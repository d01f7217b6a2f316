mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{id_of, ids, TestApp};
use petshop_api::authz::Role;

struct Tenants {
    t: TestApp,
    acme: i64,
    other: i64,
    admin: String,
    other_admin: String,
    support: String,
}

async fn two_tenants() -> Result<Tenants> {
    let t = common::spawn().await?;
    let acme = t.seed_business("Acme Petshop", "acme-petshop").await?;
    let other = t.seed_business("Other Shop", "other-shop").await?;
    let (_, admin) = t.login_as("admin@acme.com", Role::Admin, Some(acme)).await?;
    let (_, other_admin) = t.login_as("admin@other.com", Role::Admin, Some(other)).await?;
    let (_, support) = t.login_as("support@petshop.dev", Role::Support, None).await?;
    Ok(Tenants {
        t,
        acme,
        other,
        admin,
        other_admin,
        support,
    })
}

#[tokio::test]
async fn listings_are_pinned_to_the_requester_business() -> Result<()> {
    let s = two_tenants().await?;
    let (status, mine) = s.t.post("/customers", &s.admin, json!({"name": "Maria"})).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", mine);
    assert_eq!(mine["business_id"], s.acme);
    let (_, theirs) = s.t.post("/customers", &s.other_admin, json!({"name": "João"})).await?;

    // the business_id parameter does not widen an admin's view
    let (status, listed) = s.t.get(&format!("/customers?business_id={}", s.other), &s.admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&listed), vec![id_of(&mine)]);

    let (_, everything) = s.t.get("/customers", &s.support).await?;
    assert_eq!(everything.as_array().map(Vec::len), Some(2));

    let (_, filtered) = s.t.get(&format!("/customers?business_id={}", s.other), &s.support).await?;
    assert_eq!(ids(&filtered), vec![id_of(&theirs)]);
    Ok(())
}

#[tokio::test]
async fn foreign_rows_are_forbidden() -> Result<()> {
    let s = two_tenants().await?;
    let (_, theirs) = s.t.post("/customers", &s.other_admin, json!({"name": "João"})).await?;
    let uri = format!("/customers/{}", id_of(&theirs));

    let (status, body) = s.t.get(&uri, &s.admin).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = s.t.put(&uri, &s.admin, json!({"name": "Hijacked"})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = s.t.delete(&uri, &s.admin).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = s.t.get(&uri, &s.support).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = s.t.get("/customers/9999", &s.admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn creating_under_another_business_is_forbidden() -> Result<()> {
    let s = two_tenants().await?;

    let (status, _) = s
        .t
        .post("/customers", &s.admin, json!({"name": "Maria", "business_id": s.other}))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // support must say where the row goes, and it must exist
    let (status, _) = s.t.post("/customers", &s.support, json!({"name": "Maria"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = s
        .t
        .post("/customers", &s.support, json!({"name": "Maria", "business_id": 404}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = s
        .t
        .post("/customers", &s.support, json!({"name": "Maria", "business_id": s.other}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["business_id"], s.other);
    Ok(())
}

#[tokio::test]
async fn customer_updates_are_partial() -> Result<()> {
    let s = two_tenants().await?;
    let (_, customer) = s
        .t
        .post(
            "/customers",
            &s.admin,
            json!({"name": "Maria", "phone": "11999990000", "email": "maria@mail.com"}),
        )
        .await?;
    let uri = format!("/customers/{}", id_of(&customer));

    let (status, body) = s.t.put(&uri, &s.admin, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "bad request: no fields to update");

    let (status, updated) = s.t.put(&uri, &s.admin, json!({"email": null, "notes": "VIP"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Maria");
    assert_eq!(updated["phone"], "11999990000");
    assert!(updated["email"].is_null());
    assert_eq!(updated["notes"], "VIP");

    // same values again still succeeds
    let (status, again) = s.t.put(&uri, &s.admin, json!({"notes": "VIP"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["notes"], "VIP");

    let (status, _) = s.t.delete(&uri, &s.admin).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = s.t.get(&uri, &s.admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn pets_must_belong_to_a_customer_of_the_same_business() -> Result<()> {
    let s = two_tenants().await?;
    let (_, foreign_customer) = s.t.post("/customers", &s.other_admin, json!({"name": "João"})).await?;
    let (_, customer) = s.t.post("/customers", &s.admin, json!({"name": "Maria"})).await?;

    let (status, _) = s
        .t
        .post("/pets", &s.admin, json!({"customer_id": id_of(&foreign_customer), "name": "Rex"}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = s
        .t
        .post("/pets", &s.admin, json!({"customer_id": id_of(&customer), "name": "Rex", "weight": -2.0}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, pet) = s
        .t
        .post(
            "/pets",
            &s.admin,
            json!({"customer_id": id_of(&customer), "name": "Rex", "species": "dog", "birth_date": "2021-03-04"}),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", pet);
    assert_eq!(pet["business_id"], s.acme);
    assert_eq!(pet["birth_date"], "2021-03-04");

    // moving the pet to a foreign owner is refused
    let (status, _) = s
        .t
        .put(
            &format!("/pets/{}", id_of(&pet)),
            &s.admin,
            json!({"customer_id": id_of(&foreign_customer)}),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // support without a business_id files the pet under the owner's business
    let (status, support_pet) = s
        .t
        .post("/pets", &s.support, json!({"customer_id": id_of(&foreign_customer), "name": "Bolt"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(support_pet["business_id"], s.other);

    let (_, listed) = s
        .t
        .get(&format!("/pets?customer_id={}", id_of(&customer)), &s.admin)
        .await?;
    assert_eq!(ids(&listed), vec![id_of(&pet)]);
    Ok(())
}

#[tokio::test]
async fn services_are_managed_by_staff_only() -> Result<()> {
    let s = two_tenants().await?;
    let (_, user) = s.t.login_as("staff@acme.com", Role::User, Some(s.acme)).await?;

    let (status, _) = s.t.post("/services", &user, json!({"name": "Banho", "value": 50.0})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = s.t.post("/services", &s.admin, json!({"name": "Banho", "value": -1.0})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, service) = s
        .t
        .post("/services", &s.admin, json!({"name": "Banho", "value": 50.0, "duration_minutes": 60}))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", service);
    assert_eq!(service["active"], true);

    let (status, _) = s
        .t
        .post("/services", &s.admin, json!({"name": "Tosa", "value": 80.0, "active": false}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    // users can read what they cannot change
    let (status, listed) = s.t.get("/services?active=true", &user).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&listed), vec![id_of(&service)]);

    let uri = format!("/services/{}", id_of(&service));
    let (status, _) = s.t.put(&uri, &user, json!({"value": 10.0})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = s.t.put(&uri, &s.admin, json!({"value": 55.5, "duration_minutes": null})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["value"], 55.5);
    assert!(updated["duration_minutes"].is_null());
    Ok(())
}

#[tokio::test]
async fn businesses_are_scoped_like_any_resource() -> Result<()> {
    let s = two_tenants().await?;

    let (_, listed) = s.t.get("/admin/businesses", &s.admin).await?;
    assert_eq!(ids(&listed), vec![s.acme]);

    let (status, _) = s.t.get(&format!("/admin/businesses/{}", s.other), &s.admin).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = s
        .t
        .post("/admin/businesses", &s.admin, json!({"brand_name": "New", "handle": "new-shop"}))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = s
        .t
        .post("/admin/businesses", &s.support, json!({"brand_name": "New", "handle": "New-Shop"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["handle"], "new-shop");

    let (status, _) = s.t.delete(&format!("/admin/businesses/{}", s.acme), &s.admin).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = s.t.delete(&format!("/admin/businesses/{}", id_of(&created)), &s.support).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn stored_customer_matches_what_was_sent() -> Result<()> {
    let s = two_tenants().await?;
    let sent = json!({
        "name": "Maria Oliveira",
        "phone": "11999990000",
        "email": "maria@mail.com",
        "address": "Rua das Flores, 12",
        "notes": "prefers mornings"
    });
    let (status, created) = s.t.post("/customers", &s.admin, sent.clone()).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);

    let (status, fetched) = s.t.get(&format!("/customers/{}", id_of(&created)), &s.admin).await?;
    assert_eq!(status, StatusCode::OK);
    for field in ["name", "phone", "email", "address", "notes"] {
        assert_eq!(fetched[field], sent[field], "{}", field);
    }
    assert_eq!(fetched["business_id"], s.acme);
    assert_eq!(fetched, created);
    Ok(())
}

#[tokio::test]
async fn repeating_an_update_changes_nothing_else() -> Result<()> {
    let s = two_tenants().await?;
    let (_, customer) = s
        .t
        .post("/customers", &s.admin, json!({"name": "Maria", "phone": "11999990000"}))
        .await?;
    let uri = format!("/customers/{}", id_of(&customer));
    let patch = json!({"address": "Rua X, 100", "email": null, "notes": "VIP"});

    let (status, mut first) = s.t.put(&uri, &s.admin, patch.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, mut second) = s.t.put(&uri, &s.admin, patch).await?;
    assert_eq!(status, StatusCode::OK);

    for body in [&mut first, &mut second] {
        if let Some(fields) = body.as_object_mut() {
            fields.remove("updated_at");
        }
    }
    assert_eq!(first, second);
    assert_eq!(second["phone"], "11999990000");
    Ok(())
}

#[tokio::test]
async fn malformed_path_and_query_values_are_json_errors() -> Result<()> {
    let s = two_tenants().await?;

    let (status, body) = s.t.get("/customers/abc", &s.admin).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].is_string(), "{}", body);

    let (status, body) = s.t.get("/customers?business_id=abc", &s.support).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = s.t.delete("/pets/1.5", &s.admin).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    Ok(())
}

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{id_of, ids, TestApp};
use petshop_api::authz::Role;

struct Shop {
    business: i64,
    admin: String,
    customer: i64,
    pet: i64,
    service: i64,
}

async fn shop(t: &TestApp, brand: &str, handle: &str) -> Result<Shop> {
    let business = t.seed_business(brand, handle).await?;
    let (_, admin) = t.login_as(&format!("admin@{}.com", handle), Role::Admin, Some(business)).await?;
    let (_, customer) = t.post("/customers", &admin, json!({"name": "Maria", "phone": "1188887777"})).await?;
    let (_, pet) = t
        .post("/pets", &admin, json!({"customer_id": id_of(&customer), "name": "Rex"}))
        .await?;
    let (_, service) = t.post("/services", &admin, json!({"name": "Banho", "value": 50.0})).await?;
    Ok(Shop {
        business,
        admin,
        customer: id_of(&customer),
        pet: id_of(&pet),
        service: id_of(&service),
    })
}

fn slot(shop: &Shop, date: &str, time: &str) -> Value {
    json!({
        "customer_id": shop.customer,
        "pet_id": shop.pet,
        "service_id": shop.service,
        "date": date,
        "time": time
    })
}

#[tokio::test]
async fn schedule_is_ordered_and_filterable() -> Result<()> {
    let t = common::spawn().await?;
    let s = shop(&t, "Acme", "acme").await?;

    let (status, late) = t.post("/appointments", &s.admin, slot(&s, "2025-03-10", "15:30")).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", late);
    assert_eq!(late["status"], "scheduled");
    assert_eq!(late["customer_name"], "Maria");
    assert_eq!(late["service_name"], "Banho");

    let (_, early) = t.post("/appointments", &s.admin, slot(&s, "2025-03-10", "08:00:00")).await?;
    assert_eq!(early["time"], "08:00");
    let (_, next_day) = t.post("/appointments", &s.admin, slot(&s, "2025-03-11", "07:00")).await?;

    let (_, listed) = t.get("/appointments", &s.admin).await?;
    assert_eq!(ids(&listed), vec![id_of(&early), id_of(&late), id_of(&next_day)]);

    let (_, one_day) = t
        .get("/appointments?date_from=2025-03-11&date_to=2025-03-11", &s.admin)
        .await?;
    assert_eq!(ids(&one_day), vec![id_of(&next_day)]);

    let (status, _) = t.get("/appointments?status=lost", &s.admin).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.post("/appointments", &s.admin, slot(&s, "2025-03-10", "8h")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn references_must_stay_inside_the_business() -> Result<()> {
    let t = common::spawn().await?;
    let acme = shop(&t, "Acme", "acme").await?;
    let other = shop(&t, "Other", "other").await?;

    let mut foreign_pet = slot(&acme, "2025-03-10", "09:00");
    foreign_pet["pet_id"] = json!(other.pet);
    let (status, _) = t.post("/appointments", &acme.admin, foreign_pet).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut foreign_service = slot(&acme, "2025-03-10", "09:00");
    foreign_service["service_id"] = json!(other.service);
    let (status, _) = t.post("/appointments", &acme.admin, foreign_service).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, booked) = t.post("/appointments", &acme.admin, slot(&acme, "2025-03-10", "09:00")).await?;
    let uri = format!("/appointments/{}", id_of(&booked));

    let (status, _) = t.put(&uri, &acme.admin, json!({"service_id": other.service})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.get(&uri, &other.admin).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn updates_are_partial_and_can_clear_the_service() -> Result<()> {
    let t = common::spawn().await?;
    let s = shop(&t, "Acme", "acme").await?;
    let (_, booked) = t.post("/appointments", &s.admin, slot(&s, "2025-03-10", "09:00")).await?;
    let uri = format!("/appointments/{}", id_of(&booked));

    let (status, _) = t.put(&uri, &s.admin, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.put(&uri, &s.admin, json!({"status": "teleported"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = t
        .put(&uri, &s.admin, json!({"status": "completed", "service_id": null, "time": "10:15"}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["status"], "completed");
    assert!(updated["service_id"].is_null());
    assert!(updated["service_name"].is_null());
    assert_eq!(updated["time"], "10:15");
    assert_eq!(updated["date"], "2025-03-10");

    let (status, _) = t.delete(&uri, &s.admin).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.delete(&uri, &s.admin).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn handle_routes_scope_to_the_named_business() -> Result<()> {
    let t = common::spawn().await?;
    let acme = shop(&t, "Acme", "acme").await?;
    let other = shop(&t, "Other", "other").await?;
    let (_, support) = t.login_as("support@petshop.dev", Role::Support, None).await?;

    let (status, created) = t
        .post("/appointments/business/acme", &support, slot(&acme, "2025-03-10", "09:00"))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["business_id"], acme.business);

    let mut mismatched = slot(&acme, "2025-03-10", "10:00");
    mismatched["business_id"] = json!(other.business);
    let (status, _) = t.post("/appointments/business/acme", &support, mismatched).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .post("/appointments/business/acme", &other.admin, slot(&acme, "2025-03-10", "09:00"))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, listed) = t.get("/appointments/business/acme", &acme.admin).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&listed), vec![id_of(&created)]);

    let (status, _) = t.get("/appointments/business/acme", &other.admin).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.get("/appointments/business/missing", &support).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn plain_users_book_in_their_own_business() -> Result<()> {
    let t = common::spawn().await?;
    let s = shop(&t, "Acme", "acme").await?;
    let (_, user) = t.login_as("staff@acme.com", Role::User, Some(s.business)).await?;

    let (status, booked) = t.post("/appointments", &user, slot(&s, "2025-03-12", "11:00")).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booked["business_id"], s.business);

    let (status, _) = t
        .put(&format!("/appointments/{}", id_of(&booked)), &user, json!({"status": "confirmed"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

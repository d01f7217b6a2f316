use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{delete_row, push_scope, Changes};
use crate::authz::TenantScope;
use crate::errors::{AppError, AppResult};
use crate::models::pet::{Pet, PetCreateRequest, PetUpdateRequest};
use crate::utils::{require_text, utc_now};

const PET_COLUMNS: &str =
    "id, business_id, customer_id, name, species, breed, size, weight, birth_date, notes, created_at, updated_at";

pub async fn list(pool: &SqlitePool, scope: TenantScope, customer_id: Option<i64>) -> AppResult<Vec<Pet>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {PET_COLUMNS} FROM pets WHERE 1 = 1"));
    push_scope(&mut qb, "business_id", scope);
    if let Some(customer_id) = customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    qb.push(" ORDER BY created_at DESC, id DESC");

    Ok(qb.build_query_as::<Pet>().fetch_all(pool).await?)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Pet> {
    sqlx::query_as::<_, Pet>(&format!("SELECT {PET_COLUMNS} FROM pets WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("pet not found"))
}

/// Natural key used by public booking: same name, same owner.
pub async fn find_by_name(
    pool: &SqlitePool,
    business_id: i64,
    customer_id: i64,
    name: &str,
) -> AppResult<Option<Pet>> {
    let pet = sqlx::query_as::<_, Pet>(&format!(
        "SELECT {PET_COLUMNS} FROM pets WHERE business_id = ? AND customer_id = ? AND lower(name) = lower(?) ORDER BY id LIMIT 1"
    ))
    .bind(business_id)
    .bind(customer_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(pet)
}

/// `pet.business_id` is ignored; the row goes under `business_id`.
pub async fn insert(pool: &SqlitePool, business_id: i64, pet: &PetCreateRequest) -> AppResult<Pet> {
    let name = require_text("name", &pet.name)?;
    let now = utc_now();

    let id = sqlx::query(
        "INSERT INTO pets (business_id, customer_id, name, species, breed, size, weight, birth_date, notes, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(business_id)
    .bind(pet.customer_id)
    .bind(name)
    .bind(&pet.species)
    .bind(&pet.breed)
    .bind(&pet.size)
    .bind(pet.weight)
    .bind(pet.birth_date)
    .bind(&pet.notes)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, patch: PetUpdateRequest) -> AppResult<Pet> {
    let name = patch.name.as_deref().map(|name| require_text("name", name)).transpose()?;

    let mut update = Changes::new("pets", "pet");
    update
        .set_opt("customer_id", patch.customer_id)
        .set_opt("name", name)
        .set_opt("species", patch.species)
        .set_opt("breed", patch.breed)
        .set_opt("size", patch.size)
        .set_opt("weight", patch.weight)
        .set_opt("birth_date", patch.birth_date)
        .set_opt("notes", patch.notes);
    update.apply(pool, id).await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    delete_row(pool, "pets", "pet", id).await
}

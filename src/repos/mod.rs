//! Tenant-filtered persistence for every resource.
//!
//! Repositories perform no authorization: callers pass the [`TenantScope`]
//! their policy check produced and get back rows inside it.

pub mod appointments;
pub mod businesses;
pub mod customers;
pub mod financial;
pub mod goals;
pub mod pets;
pub mod refresh_tokens;
pub mod services;
pub mod users;

use sqlx::{Encode, QueryBuilder, Sqlite, SqlitePool, Type};

use crate::authz::TenantScope;
use crate::errors::{AppError, AppResult};
use crate::utils::utc_now;

/// Appends `AND <column> = ?` when the scope is a single business.
pub(crate) fn push_scope(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, scope: TenantScope) {
    if let TenantScope::Business(business_id) = scope {
        qb.push(" AND ").push(column).push(" = ").push_bind(business_id);
    }
}

/// Partial `UPDATE` over one row: only the columns passed to [`Changes::set`]
/// are written, plus `updated_at`.
pub(crate) struct Changes<'a> {
    qb: QueryBuilder<'a, Sqlite>,
    resource: &'static str,
    columns: usize,
}

impl<'a> Changes<'a> {
    pub fn new(table: &str, resource: &'static str) -> Self {
        Self {
            qb: QueryBuilder::new(format!("UPDATE {table} SET ")),
            resource,
            columns: 0,
        }
    }

    pub fn set<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: 'a + Encode<'a, Sqlite> + Type<Sqlite> + Send,
    {
        if self.columns > 0 {
            self.qb.push(", ");
        }
        self.qb.push(column).push(" = ").push_bind(value);
        self.columns += 1;
        self
    }

    /// Writes `value` only when the key was present.
    pub fn set_opt<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'a + Encode<'a, Sqlite> + Type<Sqlite> + Send,
    {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns == 0
    }

    pub async fn apply(mut self, pool: &SqlitePool, id: i64) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::bad_request("no fields to update"));
        }

        self.set("updated_at", utc_now());
        self.qb.push(" WHERE id = ").push_bind(id);

        let result = self.qb.build().execute(pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("{} not found", self.resource)));
        }
        Ok(())
    }
}

/// Hard delete by id; a missing row is a 404.
pub(crate) async fn delete_row(pool: &SqlitePool, table: &str, resource: &str, id: i64) -> AppResult<()> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("{resource} not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_adds_a_filter_only_for_one_business() {
        let mut all = QueryBuilder::<Sqlite>::new("SELECT id FROM pets WHERE 1 = 1");
        push_scope(&mut all, "business_id", TenantScope::All);
        assert_eq!(all.sql(), "SELECT id FROM pets WHERE 1 = 1");

        let mut one = QueryBuilder::<Sqlite>::new("SELECT id FROM pets WHERE 1 = 1");
        push_scope(&mut one, "business_id", TenantScope::Business(2));
        assert_eq!(one.sql(), "SELECT id FROM pets WHERE 1 = 1 AND business_id = ?");
    }

    #[test]
    fn changes_list_only_present_columns() {
        let mut changes = Changes::new("customers", "customer");
        assert!(changes.is_empty());
        changes
            .set_opt("name", Some("Ana".to_string()))
            .set_opt::<String>("phone", None)
            .set("notes", Option::<String>::None);
        assert!(!changes.is_empty());
        assert_eq!(changes.qb.sql(), "UPDATE customers SET name = ?, notes = ?");
    }
}

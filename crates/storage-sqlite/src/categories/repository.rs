use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use ledgerbook_core::categories::{
    check_deletable, check_parent_assignment, Category, CategoryRepositoryTrait, CategoryUpdate,
    NewCategory,
};
use ledgerbook_core::errors::{LedgerError, Result};

use super::model::CategoryDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{categories, transactions};

pub struct CategoryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CategoryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn find_category(conn: &mut SqliteConnection, id: &str) -> Result<Option<Category>> {
    Ok(categories::table
        .find(id)
        .select(CategoryDB::as_select())
        .first::<CategoryDB>(conn)
        .optional()
        .into_core()?
        .map(Category::from))
}

fn require_category(conn: &mut SqliteConnection, id: &str) -> Result<Category> {
    find_category(conn, id)?.ok_or_else(|| LedgerError::CategoryNotFound(id.to_string()).into())
}

fn child_count(conn: &mut SqliteConnection, id: &str) -> Result<i64> {
    categories::table
        .filter(categories::parent_id.eq(id))
        .count()
        .get_result::<i64>(conn)
        .into_core()
}

fn load_parent(conn: &mut SqliteConnection, parent_id: Option<&str>) -> Result<Option<Category>> {
    parent_id.map(|id| require_category(conn, id)).transpose()
}

#[async_trait]
impl CategoryRepositoryTrait for CategoryRepository {
    async fn create(&self, new_category: NewCategory) -> Result<Category> {
        let category_db: CategoryDB = new_category.into();
        self.writer
            .exec(move |conn| {
                let parent = load_parent(conn, category_db.parent_id.as_deref())?;
                check_parent_assignment(None, parent.as_ref(), 0)?;
                diesel::insert_into(categories::table)
                    .values(&category_db)
                    .execute(conn)
                    .into_core()?;
                Ok(category_db.into())
            })
            .await
    }

    async fn update(&self, update: CategoryUpdate) -> Result<Category> {
        self.writer
            .exec(move |conn| {
                require_category(conn, &update.id)?;
                let parent = load_parent(conn, update.parent_id.as_deref())?;
                let children = child_count(conn, &update.id)?;
                check_parent_assignment(Some(&update.id), parent.as_ref(), children)?;

                diesel::update(categories::table.find(&update.id))
                    .set((
                        categories::name.eq(&update.name),
                        categories::parent_id.eq(&update.parent_id),
                        categories::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .into_core()?;
                require_category(conn, &update.id)
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<usize> {
        let id = id.to_string();
        self.writer
            .exec(move |conn| {
                let category = require_category(conn, &id)?;
                let transaction_count = transactions::table
                    .filter(transactions::category_id.eq(&id))
                    .count()
                    .get_result::<i64>(conn)
                    .into_core()?;
                check_deletable(&category.name, child_count(conn, &id)?, transaction_count)?;
                diesel::delete(categories::table.find(&id))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Category>> {
        let mut conn = get_connection(&self.pool)?;
        find_category(&mut conn, id)
    }

    fn list(&self) -> Result<Vec<Category>> {
        let mut conn = get_connection(&self.pool)?;
        // Top-level categories first, each group by name.
        let rows = categories::table
            .select(CategoryDB::as_select())
            .order((categories::parent_id.is_not_null(), categories::name.asc()))
            .load::<CategoryDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    fn transaction_counts(&self) -> Result<HashMap<String, i64>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions::table
            .group_by(transactions::category_id)
            .select((transactions::category_id, count_star()))
            .load::<(String, i64)>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().collect())
    }
}

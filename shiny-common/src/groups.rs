//! Group store
//!
//! Groups are created and deleted by an administrator. Deleting a group
//! nulls the group reference of its users and preferences (declared as
//! `ON DELETE SET NULL` on those tables), it never deletes them.

use sqlx::SqlitePool;
use tracing::info;

use crate::db::Group;
use crate::{Error, Result};

/// Create a group. Names need not be unique.
pub async fn create_group(pool: &SqlitePool, name: &str) -> Result<Group> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::field("name", "This field may not be blank."));
    }

    let id = sqlx::query("INSERT INTO groups (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?
        .last_insert_rowid();

    info!("Created group {} ({})", id, name);

    Ok(Group {
        id,
        name: name.to_string(),
    })
}

pub async fn get_group(pool: &SqlitePool, id: i64) -> Result<Option<Group>> {
    let group = sqlx::query_as::<_, Group>("SELECT id, name FROM groups WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(group)
}

pub async fn list_groups(pool: &SqlitePool) -> Result<Vec<Group>> {
    let groups = sqlx::query_as::<_, Group>("SELECT id, name FROM groups ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(groups)
}

/// Delete a group; returns `NotFound` if it does not exist
pub async fn delete_group(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM groups WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("group {}", id)));
    }

    info!("Deleted group {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_group_crud() {
        let pool = init_memory_database().await.unwrap();

        let a = create_group(&pool, "Penobscot").await.unwrap();
        let b = create_group(&pool, "Penobscot").await.unwrap();
        assert_ne!(a.id, b.id, "names are not unique");

        assert_eq!(get_group(&pool, a.id).await.unwrap(), Some(a.clone()));
        assert_eq!(list_groups(&pool).await.unwrap().len(), 2);

        delete_group(&pool, a.id).await.unwrap();
        assert_eq!(get_group(&pool, a.id).await.unwrap(), None);
        assert!(matches!(
            delete_group(&pool, a.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let pool = init_memory_database().await.unwrap();
        assert!(matches!(
            create_group(&pool, "   ").await,
            Err(Error::Validation(_))
        ));
    }
}

use std::sync::MutexGuard;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::models::Group;

use super::Repository;

pub trait GroupRepository: Repository<Entity = Group, Id = str> {
    fn find_by_name(&self, name: &str) -> Result<Option<Group>>;
    /// Active groups ordered by name.
    fn list(&self) -> Result<Vec<Group>>;
}

pub struct SqliteGroupRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteGroupRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_group(row: &rusqlite::Row) -> rusqlite::Result<Group> {
        Ok(Group {
            id: row.get(0)?,
            name: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
        })
    }
}

impl<'a> Repository for SqliteGroupRepository<'a> {
    type Entity = Group;
    type Id = str;

    fn find_by_id(&self, id: &str) -> Result<Option<Group>> {
        let group = self
            .conn
            .query_row(
                "SELECT id, name, title, description FROM groups
                 WHERE id = ?1 AND state = 'active'",
                params![id],
                Self::row_to_group,
            )
            .optional()?;
        Ok(group)
    }

    fn save(&self, group: &Group) -> Result<()> {
        self.conn.execute(
            "INSERT INTO groups (id, name, title, description, state)
             VALUES (?1, ?2, ?3, ?4, 'active')
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                title = excluded.title,
                description = excluded.description,
                state = 'active'",
            params![group.id, group.name, group.title, group.description],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE groups SET state = 'deleted' WHERE id = ?1 AND state = 'active'",
            params![id],
        )?;
        Ok(changed > 0)
    }
}

impl<'a> GroupRepository for SqliteGroupRepository<'a> {
    fn find_by_name(&self, name: &str) -> Result<Option<Group>> {
        let group = self
            .conn
            .query_row(
                "SELECT id, name, title, description FROM groups
                 WHERE name = ?1 AND state = 'active'",
                params![name],
                Self::row_to_group,
            )
            .optional()?;
        Ok(group)
    }

    fn list(&self) -> Result<Vec<Group>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, title, description FROM groups
             WHERE state = 'active' ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_group)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

use chrono::NaiveDateTime;
use diesel::{delete, insert_into, prelude::*, update, SqliteConnection};
use tracing::info;

use crate::{
    db::{
        models::{new_id, now, NewSubtask, Subtask, Task},
        schema::subtasks,
    },
    error::ApiError,
};

#[derive(Debug, AsChangeset)]
#[diesel(table_name = subtasks)]
pub struct SubtaskChangeSet {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
    pub updated_at: NaiveDateTime,
}

impl Subtask {
    pub fn find(conn: &mut SqliteConnection, subtask_id: &str) -> Result<Subtask, ApiError> {
        subtasks::table
            .find(subtask_id)
            .select(Subtask::as_select())
            .first(conn)
            .optional()?
            .ok_or(ApiError::NotFound("Subtask"))
    }
}

pub trait CreateSubtask {
    fn create(conn: &mut SqliteConnection, task_id: &str, title: &str)
        -> Result<Subtask, ApiError>;
}

impl CreateSubtask for Subtask {
    fn create(
        conn: &mut SqliteConnection,
        task_id: &str,
        title: &str,
    ) -> Result<Subtask, ApiError> {
        conn.transaction(|conn| {
            Task::find(conn, task_id)?;
            let subtask_id = new_id();
            let created_at = now();

            insert_into(subtasks::table)
                .values(NewSubtask {
                    id: &subtask_id,
                    task_id,
                    title,
                    is_completed: false,
                    created_at,
                    updated_at: created_at,
                })
                .execute(conn)?;

            info!("Created subtask {} on task {}", subtask_id, task_id);
            Subtask::find(conn, &subtask_id)
        })
    }
}

pub trait UpdateSubtask {
    fn update(
        conn: &mut SqliteConnection,
        subtask_id: &str,
        change_set: SubtaskChangeSet,
    ) -> Result<Subtask, ApiError>;
}

impl UpdateSubtask for Subtask {
    fn update(
        conn: &mut SqliteConnection,
        subtask_id: &str,
        change_set: SubtaskChangeSet,
    ) -> Result<Subtask, ApiError> {
        let updated = update(subtasks::table.find(subtask_id))
            .set(&change_set)
            .execute(conn)?;
        if updated == 0 {
            return Err(ApiError::NotFound("Subtask"));
        }
        Subtask::find(conn, subtask_id)
    }
}

pub trait DeleteSubtask {
    fn delete(conn: &mut SqliteConnection, subtask_id: &str) -> Result<Subtask, ApiError>;
}

impl DeleteSubtask for Subtask {
    fn delete(conn: &mut SqliteConnection, subtask_id: &str) -> Result<Subtask, ApiError> {
        let subtask = Subtask::find(conn, subtask_id)?;
        delete(subtasks::table.find(subtask_id)).execute(conn)?;
        info!("Deleted subtask {}", subtask_id);
        Ok(subtask)
    }
}

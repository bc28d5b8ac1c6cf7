use chrono::NaiveDateTime;
use diesel::{delete, insert_into, prelude::*, update, SqliteConnection};
use tracing::info;

use crate::{
    db::{
        models::{new_id, now, Column, NewTask, Subtask, Task},
        repos::ordering::{self, ColumnTasks},
        schema::{subtasks, tasks},
    },
    error::ApiError,
    views::{self, TaskView},
};

/// Requested task changes. `description: Some(None)` clears the description.
#[derive(Debug, Default)]
pub struct TaskChangeSet {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub column_id: Option<String>,
    pub order: Option<i64>,
}

#[derive(AsChangeset)]
#[diesel(table_name = tasks)]
struct TaskFields {
    title: Option<String>,
    description: Option<Option<String>>,
    updated_at: NaiveDateTime,
}

impl Task {
    pub fn find(conn: &mut SqliteConnection, task_id: &str) -> Result<Task, ApiError> {
        tasks::table
            .find(task_id)
            .select(Task::as_select())
            .first(conn)
            .optional()?
            .ok_or(ApiError::NotFound("Task"))
    }

    pub fn for_column(conn: &mut SqliteConnection, column_id: &str) -> QueryResult<Vec<Task>> {
        tasks::table
            .filter(tasks::column_id.eq(column_id))
            .order(tasks::order.asc())
            .select(Task::as_select())
            .load(conn)
    }
}

fn subtasks_of(conn: &mut SqliteConnection, task_ids: Vec<String>) -> QueryResult<Vec<Subtask>> {
    subtasks::table
        .filter(subtasks::task_id.eq_any(task_ids))
        .order((subtasks::created_at.asc(), subtasks::id.asc()))
        .select(Subtask::as_select())
        .load(conn)
}

/// A task with its subtasks and computed fields.
pub fn load_task(conn: &mut SqliteConnection, task: Task) -> Result<TaskView, ApiError> {
    let column = Column::find(conn, &task.column_id)?;
    let subtasks = subtasks_of(conn, vec![task.id.clone()])?;
    Ok(views::task_view(task, &column.name, subtasks))
}

/// Every task of a column, in order.
pub fn load_column_tasks(
    conn: &mut SqliteConnection,
    column_id: &str,
) -> Result<Vec<TaskView>, ApiError> {
    let column = Column::find(conn, column_id)?;
    let tasks = Task::for_column(conn, column_id)?;
    let subtasks = subtasks_of(conn, tasks.iter().map(|task| task.id.clone()).collect())?;
    Ok(views::column_tasks(&column, tasks, subtasks))
}

pub trait CreateTask {
    fn create(
        conn: &mut SqliteConnection,
        column_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, ApiError>;
}

impl CreateTask for Task {
    fn create(
        conn: &mut SqliteConnection,
        column_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, ApiError> {
        conn.immediate_transaction(|conn| {
            Column::find(conn, column_id)?;
            let task_id = new_id();
            let created_at = now();
            let order = ordering::next_order::<ColumnTasks>(conn, column_id)?;

            insert_into(tasks::table)
                .values(NewTask {
                    id: &task_id,
                    column_id,
                    title,
                    description,
                    order,
                    created_at,
                    updated_at: created_at,
                })
                .execute(conn)?;

            info!("Created task {} in column {} at {}", task_id, column_id, order);
            Task::find(conn, &task_id)
        })
    }
}

pub trait UpdateTask {
    fn update(
        conn: &mut SqliteConnection,
        task_id: &str,
        change_set: TaskChangeSet,
    ) -> Result<Task, ApiError>;
}

impl UpdateTask for Task {
    /// A different `column_id` moves the task across columns, with `order` as
    /// the destination slot. Otherwise `order` alone reorders within the column.
    fn update(
        conn: &mut SqliteConnection,
        task_id: &str,
        change_set: TaskChangeSet,
    ) -> Result<Task, ApiError> {
        conn.immediate_transaction(|conn| {
            let task = Task::find(conn, task_id)?;

            match change_set.column_id.as_deref() {
                Some(destination) if destination != task.column_id => {
                    Column::find(conn, destination).map_err(|err| match err {
                        ApiError::NotFound(_) => {
                            ApiError::invalid("column_id", "The selected column id is invalid.")
                        }
                        other => other,
                    })?;
                    ordering::transfer::<ColumnTasks>(
                        conn,
                        &task.id,
                        &task.column_id,
                        task.order,
                        destination,
                        change_set.order,
                    )?;
                }
                _ => {
                    if let Some(requested) = change_set.order {
                        ordering::reorder::<ColumnTasks>(
                            conn,
                            &task.column_id,
                            &task.id,
                            task.order,
                            requested,
                        )?;
                    }
                }
            }

            update(tasks::table.find(task_id))
                .set(TaskFields {
                    title: change_set.title,
                    description: change_set.description,
                    updated_at: now(),
                })
                .execute(conn)?;

            Task::find(conn, task_id)
        })
    }
}

pub trait DeleteTask {
    fn delete(conn: &mut SqliteConnection, task_id: &str) -> Result<Task, ApiError>;
}

impl DeleteTask for Task {
    fn delete(conn: &mut SqliteConnection, task_id: &str) -> Result<Task, ApiError> {
        conn.immediate_transaction(|conn| {
            let task = Task::find(conn, task_id)?;
            delete(tasks::table.find(task_id)).execute(conn)?;
            ordering::compact::<ColumnTasks>(conn, &task.column_id)?;

            info!("Deleted task {} from column {}", task_id, task.column_id);
            Ok(task)
        })
    }
}

use chrono::NaiveDateTime;
use diesel::{delete, insert_into, prelude::*, update, SqliteConnection};
use tracing::info;

use crate::{
    db::{
        models::{new_id, now, Board, Column, NewBoard, NewColumn, Subtask, Task},
        schema::{board_columns, boards, subtasks, tasks},
    },
    error::ApiError,
    views::{self, BoardView},
};

/// Columns every new board starts with, in order.
pub const DEFAULT_COLUMNS: [&str; 3] = ["Todo", "Doing", "Done"];

#[derive(AsChangeset)]
#[diesel(table_name = boards)]
pub struct BoardChangeSet {
    pub name: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl Board {
    pub fn find(conn: &mut SqliteConnection, board_id: &str) -> Result<Board, ApiError> {
        boards::table
            .find(board_id)
            .select(Board::as_select())
            .first(conn)
            .optional()?
            .ok_or(ApiError::NotFound("Board"))
    }

    pub fn all(conn: &mut SqliteConnection) -> QueryResult<Vec<Board>> {
        boards::table
            .order((boards::created_at.asc(), boards::id.asc()))
            .select(Board::as_select())
            .load(conn)
    }
}

/// Loads columns, tasks and subtasks under `boards` and nests them.
pub fn load_tree(
    conn: &mut SqliteConnection,
    boards: Vec<Board>,
) -> Result<Vec<BoardView>, ApiError> {
    let board_ids: Vec<String> = boards.iter().map(|board| board.id.clone()).collect();
    let columns: Vec<Column> = board_columns::table
        .filter(board_columns::board_id.eq_any(board_ids))
        .order(board_columns::order.asc())
        .select(Column::as_select())
        .load(conn)?;

    let column_ids: Vec<String> = columns.iter().map(|column| column.id.clone()).collect();
    let tasks: Vec<Task> = tasks::table
        .filter(tasks::column_id.eq_any(column_ids))
        .order(tasks::order.asc())
        .select(Task::as_select())
        .load(conn)?;

    let task_ids: Vec<String> = tasks.iter().map(|task| task.id.clone()).collect();
    let subtasks: Vec<Subtask> = subtasks::table
        .filter(subtasks::task_id.eq_any(task_ids))
        .order((subtasks::created_at.asc(), subtasks::id.asc()))
        .select(Subtask::as_select())
        .load(conn)?;

    Ok(views::assemble(boards, columns, tasks, subtasks))
}

/// Loads one board with everything under it.
pub fn load_board(conn: &mut SqliteConnection, board: Board) -> Result<BoardView, ApiError> {
    load_tree(conn, vec![board])?
        .pop()
        .ok_or(ApiError::NotFound("Board"))
}

pub trait CreateBoard {
    fn create(conn: &mut SqliteConnection, name: &str) -> Result<Board, ApiError>;
}

impl CreateBoard for Board {
    fn create(conn: &mut SqliteConnection, name: &str) -> Result<Board, ApiError> {
        conn.immediate_transaction(|conn| {
            let board_id = new_id();
            let created_at = now();

            insert_into(boards::table)
                .values(NewBoard {
                    id: &board_id,
                    name,
                    created_at,
                    updated_at: created_at,
                })
                .execute(conn)?;

            for (index, column_name) in DEFAULT_COLUMNS.iter().enumerate() {
                insert_into(board_columns::table)
                    .values(NewColumn {
                        id: &new_id(),
                        board_id: &board_id,
                        name: column_name,
                        order: index as i32,
                        created_at,
                        updated_at: created_at,
                    })
                    .execute(conn)?;
            }

            info!("Created board {} ({})", board_id, name);
            Board::find(conn, &board_id)
        })
    }
}

pub trait UpdateBoard {
    fn update(
        conn: &mut SqliteConnection,
        board_id: &str,
        change_set: BoardChangeSet,
    ) -> Result<Board, ApiError>;
}

impl UpdateBoard for Board {
    fn update(
        conn: &mut SqliteConnection,
        board_id: &str,
        change_set: BoardChangeSet,
    ) -> Result<Board, ApiError> {
        let updated = update(boards::table.find(board_id))
            .set(&change_set)
            .execute(conn)?;
        if updated == 0 {
            return Err(ApiError::NotFound("Board"));
        }
        Board::find(conn, board_id)
    }
}

pub trait DeleteBoard {
    fn delete(conn: &mut SqliteConnection, board_id: &str) -> Result<Board, ApiError>;
}

impl DeleteBoard for Board {
    /// Columns, tasks and subtasks go with the board through `ON DELETE CASCADE`.
    fn delete(conn: &mut SqliteConnection, board_id: &str) -> Result<Board, ApiError> {
        conn.immediate_transaction(|conn| {
            let board = Board::find(conn, board_id)?;
            delete(boards::table.find(board_id)).execute(conn)?;
            info!("Deleted board {}", board_id);
            Ok(board)
        })
    }
}

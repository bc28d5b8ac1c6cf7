use diesel::{delete, insert_into, prelude::*, update, SqliteConnection};
use tracing::info;

use crate::{
    db::{
        models::{new_id, now, Board, Column, NewColumn},
        repos::ordering::{self, BoardColumns},
        schema::board_columns,
    },
    error::ApiError,
};

#[derive(Debug, Default)]
pub struct ColumnChangeSet {
    pub name: Option<String>,
    pub order: Option<i64>,
}

impl Column {
    pub fn find(conn: &mut SqliteConnection, column_id: &str) -> Result<Column, ApiError> {
        board_columns::table
            .find(column_id)
            .select(Column::as_select())
            .first(conn)
            .optional()?
            .ok_or(ApiError::NotFound("Column"))
    }

    /// Like `find`, but a column that belongs to another board is not found.
    pub fn find_in_board(
        conn: &mut SqliteConnection,
        board_id: &str,
        column_id: &str,
    ) -> Result<Column, ApiError> {
        Board::find(conn, board_id)?;
        let column = Column::find(conn, column_id)?;
        if column.board_id != board_id {
            return Err(ApiError::NotFound("Column"));
        }
        Ok(column)
    }
}

pub trait CreateColumn {
    fn create(conn: &mut SqliteConnection, board_id: &str, name: &str) -> Result<Column, ApiError>;
}

impl CreateColumn for Column {
    fn create(conn: &mut SqliteConnection, board_id: &str, name: &str) -> Result<Column, ApiError> {
        conn.immediate_transaction(|conn| {
            Board::find(conn, board_id)?;
            let column_id = new_id();
            let created_at = now();
            let order = ordering::next_order::<BoardColumns>(conn, board_id)?;

            insert_into(board_columns::table)
                .values(NewColumn {
                    id: &column_id,
                    board_id,
                    name,
                    order,
                    created_at,
                    updated_at: created_at,
                })
                .execute(conn)?;

            info!("Created column {} on board {} at {}", column_id, board_id, order);
            Column::find(conn, &column_id)
        })
    }
}

pub trait UpdateColumn {
    fn update(
        conn: &mut SqliteConnection,
        board_id: &str,
        column_id: &str,
        change_set: ColumnChangeSet,
    ) -> Result<Column, ApiError>;
}

impl UpdateColumn for Column {
    fn update(
        conn: &mut SqliteConnection,
        board_id: &str,
        column_id: &str,
        change_set: ColumnChangeSet,
    ) -> Result<Column, ApiError> {
        conn.immediate_transaction(|conn| {
            let column = Column::find_in_board(conn, board_id, column_id)?;

            if let Some(requested) = change_set.order {
                ordering::reorder::<BoardColumns>(
                    conn,
                    board_id,
                    &column.id,
                    column.order,
                    requested,
                )?;
            }

            if let Some(name) = change_set.name {
                update(board_columns::table.find(column_id))
                    .set((
                        board_columns::name.eq(name),
                        board_columns::updated_at.eq(now()),
                    ))
                    .execute(conn)?;
            }

            Column::find(conn, column_id)
        })
    }
}

pub trait DeleteColumn {
    fn delete(
        conn: &mut SqliteConnection,
        board_id: &str,
        column_id: &str,
    ) -> Result<Column, ApiError>;
}

impl DeleteColumn for Column {
    /// Removes the column with its tasks, then closes the gap among the rest.
    fn delete(
        conn: &mut SqliteConnection,
        board_id: &str,
        column_id: &str,
    ) -> Result<Column, ApiError> {
        conn.immediate_transaction(|conn| {
            let column = Column::find_in_board(conn, board_id, column_id)?;
            delete(board_columns::table.find(column_id)).execute(conn)?;
            ordering::compact::<BoardColumns>(conn, board_id)?;

            info!("Deleted column {} from board {}", column_id, board_id);
            Ok(column)
        })
    }
}

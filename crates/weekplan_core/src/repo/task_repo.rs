//! Task snapshot repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the local save/load contract consumed by the engine.
//! - Heal legacy non-UUID identifiers at this boundary, before tasks reach
//!   the manager.
//! - Filter malformed persisted rows, logging a count, so one corrupt row
//!   cannot take the whole snapshot down.
//!
//! # Invariants
//! - `save_tasks` validates every task before SQL mutations.
//! - The engine upstream only ever sees UUID identities and valid tasks.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::task::{
    BoardRow, EisenhowerQuad, Space, Task, TaskKind, TaskStatus, TaskValidationError,
};
use chrono::NaiveDate;
use log::warn;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    duration,
    kind,
    status,
    due_date,
    assigned_row,
    eisenhower_quad,
    notes,
    parent_id,
    created_at,
    completed_at,
    sort_order,
    is_frozen,
    space
FROM tasks";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "title",
    "duration",
    "kind",
    "status",
    "due_date",
    "assigned_row",
    "eisenhower_quad",
    "notes",
    "parent_id",
    "created_at",
    "completed_at",
    "sort_order",
    "is_frozen",
    "space",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    /// Connection has no applied migrations.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is not initialized to {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table missing: {table}")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column missing: {table}.{column}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Snapshot persistence contract for the local task list.
pub trait TaskRepository {
    /// Loads the persisted snapshot. Malformed rows are dropped, legacy
    /// identifiers healed.
    fn load_tasks(&self) -> RepoResult<Vec<Task>>;

    /// Replaces the persisted snapshot with `tasks`.
    fn save_tasks(&self, tasks: &[Task]) -> RepoResult<()>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Wraps a connection after verifying migrations ran and the schema
    /// carries every required column.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version =
            conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        let expected_version = latest_version();
        if actual_version == 0 {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let table_exists = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'tasks';",
                [],
                |_| Ok(()),
            )
            .map(|_| true)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(false),
                other => Err(other),
            })?;
        if !table_exists {
            return Err(RepoError::MissingRequiredTable("tasks"));
        }

        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('tasks');")?;
        let mut rows = stmt.query([])?;
        let mut present = Vec::new();
        while let Some(row) = rows.next()? {
            present.push(row.get::<_, String>(0)?);
        }
        for column in REQUIRED_COLUMNS {
            if !present.iter().any(|name| name.as_str() == *column) {
                return Err(RepoError::MissingRequiredColumn {
                    table: "tasks",
                    column,
                });
            }
        }

        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn load_tasks(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY sort_order ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;

        let mut tasks = Vec::new();
        let mut dropped = 0usize;
        let mut healed = 0usize;

        while let Some(row) = rows.next()? {
            match parse_task_row(row) {
                Ok((task, id_was_healed)) => {
                    if id_was_healed {
                        healed += 1;
                    }
                    tasks.push(task);
                }
                Err(details) => {
                    dropped += 1;
                    warn!("event=load_tasks module=repo status=row_dropped error={details}");
                }
            }
        }

        if dropped > 0 || healed > 0 {
            warn!(
                "event=load_tasks module=repo status=degraded dropped={dropped} healed_ids={healed}"
            );
        }

        Ok(tasks)
    }

    fn save_tasks(&self, tasks: &[Task]) -> RepoResult<()> {
        for task in tasks {
            task.validate()?;
        }

        self.conn.execute_batch("BEGIN;")?;
        let result = (|| -> RepoResult<()> {
            self.conn.execute("DELETE FROM tasks;", [])?;
            for task in tasks {
                self.conn.execute(
                    "INSERT INTO tasks (
                        id, title, duration, kind, status, due_date, assigned_row,
                        eisenhower_quad, notes, parent_id, created_at, completed_at,
                        sort_order, is_frozen, space
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
                    params![
                        task.id.to_string(),
                        task.title.as_str(),
                        task.duration,
                        kind_to_db(task.kind),
                        status_to_db(task.status),
                        task.due_date.map(date_to_db),
                        task.assigned_row.map(row_to_db),
                        task.eisenhower_quad.map(quad_to_db),
                        task.notes.as_deref(),
                        task.parent_id.map(|id| id.to_string()),
                        task.created_at,
                        task.completed_at,
                        task.sort_order,
                        task.is_frozen as i64,
                        space_to_db(task.space),
                    ],
                )?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }
}

/// Parses one persisted row. The boolean reports whether a legacy non-UUID
/// identifier was re-minted.
fn parse_task_row(row: &Row<'_>) -> Result<(Task, bool), String> {
    let id_text: String = get(row, "id")?;
    let (id, id_was_healed) = match Uuid::parse_str(&id_text) {
        Ok(id) => (id, false),
        // Pre-UUID installs used arbitrary client-generated strings.
        Err(_) => (Uuid::new_v4(), true),
    };

    let kind_text: String = get(row, "kind")?;
    let kind =
        parse_kind(&kind_text).ok_or_else(|| format!("invalid kind `{kind_text}`"))?;

    let status_text: String = get(row, "status")?;
    let status =
        parse_status(&status_text).ok_or_else(|| format!("invalid status `{status_text}`"))?;

    let due_date = match get::<Option<String>>(row, "due_date")? {
        Some(value) => Some(
            NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .map_err(|_| format!("invalid due_date `{value}`"))?,
        ),
        None => None,
    };

    let assigned_row = match get::<Option<String>>(row, "assigned_row")? {
        Some(value) => {
            Some(parse_row(&value).ok_or_else(|| format!("invalid assigned_row `{value}`"))?)
        }
        None => None,
    };

    let eisenhower_quad = match get::<Option<String>>(row, "eisenhower_quad")? {
        Some(value) => {
            Some(parse_quad(&value).ok_or_else(|| format!("invalid eisenhower_quad `{value}`"))?)
        }
        None => None,
    };

    let parent_id = match get::<Option<String>>(row, "parent_id")? {
        // A parent pointer to a legacy id cannot be followed once ids are
        // re-minted; treat it like no parent rather than a broken link.
        Some(value) => Uuid::parse_str(&value).ok(),
        None => None,
    };

    let space_text: String = get(row, "space")?;
    let space =
        parse_space(&space_text).ok_or_else(|| format!("invalid space `{space_text}`"))?;

    let duration: i64 = get(row, "duration")?;
    let duration =
        u32::try_from(duration).map_err(|_| format!("invalid duration `{duration}`"))?;

    let task = Task {
        id,
        title: get(row, "title")?,
        duration,
        kind,
        status,
        due_date,
        assigned_row,
        eisenhower_quad,
        notes: get(row, "notes")?,
        parent_id,
        created_at: get(row, "created_at")?,
        completed_at: get(row, "completed_at")?,
        sort_order: get(row, "sort_order")?,
        is_frozen: get::<i64>(row, "is_frozen")? != 0,
        space,
    };
    task.validate().map_err(|err| err.to_string())?;

    Ok((task, id_was_healed))
}

fn get<T: rusqlite::types::FromSql>(row: &Row<'_>, column: &str) -> Result<T, String> {
    row.get(column)
        .map_err(|err| format!("column `{column}`: {err}"))
}

fn kind_to_db(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Backlog => "backlog",
        TaskKind::High => "high",
        TaskKind::Medium => "medium",
        TaskKind::Low => "low",
        TaskKind::Leisure => "leisure",
        TaskKind::Chores => "chores",
    }
}

fn parse_kind(value: &str) -> Option<TaskKind> {
    match value {
        "backlog" => Some(TaskKind::Backlog),
        "high" => Some(TaskKind::High),
        "medium" => Some(TaskKind::Medium),
        "low" => Some(TaskKind::Low),
        "leisure" => Some(TaskKind::Leisure),
        "chores" => Some(TaskKind::Chores),
        _ => None,
    }
}

fn status_to_db(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Unscheduled => "unscheduled",
        TaskStatus::Scheduled => "scheduled",
        TaskStatus::Completed => "completed",
        TaskStatus::Rescheduled => "rescheduled",
    }
}

fn parse_status(value: &str) -> Option<TaskStatus> {
    match value {
        "unscheduled" => Some(TaskStatus::Unscheduled),
        "scheduled" => Some(TaskStatus::Scheduled),
        "completed" => Some(TaskStatus::Completed),
        "rescheduled" => Some(TaskStatus::Rescheduled),
        _ => None,
    }
}

fn row_to_db(row: BoardRow) -> &'static str {
    match row {
        BoardRow::Goal => "GOAL",
        BoardRow::Focus => "FOCUS",
        BoardRow::Work => "WORK",
        BoardRow::Leisure => "LEISURE",
        BoardRow::Chores => "CHORES",
    }
}

fn parse_row(value: &str) -> Option<BoardRow> {
    match value {
        "GOAL" => Some(BoardRow::Goal),
        "FOCUS" => Some(BoardRow::Focus),
        "WORK" => Some(BoardRow::Work),
        "LEISURE" => Some(BoardRow::Leisure),
        "CHORES" => Some(BoardRow::Chores),
        _ => None,
    }
}

fn quad_to_db(quad: EisenhowerQuad) -> &'static str {
    match quad {
        EisenhowerQuad::Do => "do",
        EisenhowerQuad::Decide => "decide",
        EisenhowerQuad::Delegate => "delegate",
        EisenhowerQuad::Delete => "delete",
    }
}

fn parse_quad(value: &str) -> Option<EisenhowerQuad> {
    match value {
        "do" => Some(EisenhowerQuad::Do),
        "decide" => Some(EisenhowerQuad::Decide),
        "delegate" => Some(EisenhowerQuad::Delegate),
        "delete" => Some(EisenhowerQuad::Delete),
        _ => None,
    }
}

fn space_to_db(space: Space) -> &'static str {
    match space {
        Space::Work => "work",
        Space::Private => "private",
    }
}

fn parse_space(value: &str) -> Option<Space> {
    match value {
        "work" => Some(Space::Work),
        "private" => Some(Space::Private),
        _ => None,
    }
}

fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

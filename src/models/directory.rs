// src/models/directory.rs

use serde::Serialize;
use sqlx::FromRow;

/// Top-level curriculum grouping. Pure directory data.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Module {
    pub id: i64,
    pub name: String,
}

/// Class/cohort inside a module. Unique per (name, module_id).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub module_id: i64,
}

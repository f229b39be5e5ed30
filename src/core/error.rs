// src/core/error.rs
//! Error types for the storage and configuration layers

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create database directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open database {path}")]
    Open { path: PathBuf, source: sqlx::Error },

    #[error("failed to prepare clipboard_entries schema")]
    Schema(#[source] sqlx::Error),

    #[error("failed to insert entry {hash}")]
    Insert { hash: String, source: sqlx::Error },

    #[error("query failed")]
    Query(#[from] sqlx::Error),

    #[error("stored row {id} is malformed: {reason}")]
    Decode { id: i64, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

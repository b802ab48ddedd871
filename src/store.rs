// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Key/value persistence of the book: a local sqlite table and an optional
//! PostgREST-style remote table with the same shape.

use crate::book::Book;
use reqwest::blocking::Client;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const TRANSACTIONS_KEY: &str = "transactions";
pub const BUDGETS_KEY: &str = "budgets";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid JSON blob: {0}")]
    Json(#[from] serde_json::Error),
    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

pub trait BlobStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl BlobStore for SqliteStore<'_> {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM app_data WHERE key=?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO app_data(key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
            params![key, serde_json::to_string(value)?],
        )?;
        Ok(())
    }
}

pub struct RemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct Row {
    value: Value,
}

impl RemoteStore {
    pub fn new(url: &str, api_key: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: crate::utils::http_client()?,
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/app_data", self.base_url)
    }

    fn authed(&self, rb: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        rb.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Probes the table without downloading rows.
    pub fn check_connection(&self) -> bool {
        let req = self.authed(self.client.head(self.table_url()).query(&[("select", "key")]));
        match req.send() {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "remote connection check failed");
                false
            }
            Err(err) => {
                warn!(error = %err, "remote connection check failed");
                false
            }
        }
    }
}

fn check_status(
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

impl BlobStore for RemoteStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let filter = format!("eq.{}", key);
        let req = self.authed(
            self.client
                .get(self.table_url())
                .query(&[("key", filter.as_str()), ("select", "value")]),
        );
        let rows: Vec<Row> = check_status(req.send()?)?.json()?;
        Ok(rows.into_iter().next().map(|r| r.value).filter(|v| !v.is_null()))
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let body = json!([{
            "key": key,
            "value": value,
            "updated_at": chrono::Utc::now().to_rfc3339(),
        }]);
        let req = self.authed(
            self.client
                .post(self.table_url())
                .query(&[("on_conflict", "key")])
                .header("Prefer", "resolution=merge-duplicates")
                .json(&body),
        );
        check_status(req.send()?)?;
        Ok(())
    }
}

/// Local copy is authoritative for writes; the remote is best effort.
pub struct SyncedStore<'a> {
    local: SqliteStore<'a>,
    remote: Option<Box<dyn BlobStore + 'a>>,
}

impl<'a> SyncedStore<'a> {
    pub fn new(local: SqliteStore<'a>, remote: Option<Box<dyn BlobStore + 'a>>) -> Self {
        Self { local, remote }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }
}

impl BlobStore for SyncedStore<'_> {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if let Some(remote) = &self.remote {
            match remote.load(key) {
                Ok(Some(v)) => {
                    debug!(key, "loaded from remote");
                    return Ok(Some(v));
                }
                Ok(None) => debug!(key, "no remote row, using local copy"),
                Err(err) => warn!(key, error = %err, "remote load failed, using local copy"),
            }
        }
        self.local.load(key)
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.local.save(key, value)?;
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.save(key, value) {
                warn!(key, error = %err, "remote save failed, kept local copy");
            }
        }
        Ok(())
    }
}

pub fn load_book(store: &dyn BlobStore) -> Result<Book, StoreError> {
    let transactions = match store.load(TRANSACTIONS_KEY)? {
        Some(v) => serde_json::from_value(v)?,
        None => Vec::new(),
    };
    let budgets = match store.load(BUDGETS_KEY)? {
        Some(v) => serde_json::from_value(v)?,
        None => Vec::new(),
    };
    Ok(Book {
        transactions,
        budgets,
    })
}

pub fn save_book(store: &dyn BlobStore, book: &Book) -> Result<(), StoreError> {
    store.save(TRANSACTIONS_KEY, &serde_json::to_value(&book.transactions)?)?;
    store.save(BUDGETS_KEY, &serde_json::to_value(&book.budgets)?)?;
    Ok(())
}

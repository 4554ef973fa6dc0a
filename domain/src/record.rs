//! Expense and income records.
//!
//! Storage is process-local; what matters here is the mutation contract:
//! every create, update, delete and attachment removal publishes
//! `DomainEvent::RecordMutated` for the owner after the change is committed,
//! and publishes nothing when the change fails.
//!
//! Creates and updates also append a [`RecordLog`] snapshot, giving each
//! record an edit history.

use crate::error::Error;
use crate::Id;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use events::{DomainEvent, EventPublisher, Mutation};
use log::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

const CURRENCY_CODE: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RecordKind {
    #[serde(rename = "expenses")]
    Expense,
    #[serde(rename = "income")]
    Income,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordKind::Expense => write!(f, "expense"),
            RecordKind::Income => write!(f, "income"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Record {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: Id,
    pub kind: RecordKind,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub currency_code: String,
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A snapshot of a record taken when it was created or updated.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecordLog {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub record_id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: Id,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub currency_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Record> for RecordLog {
    fn from(record: &Record) -> Self {
        RecordLog {
            id: Id::new_v4(),
            record_id: record.id,
            user_id: record.user_id,
            title: record.title.clone(),
            description: record.description.clone(),
            amount: record.amount,
            currency_code: record.currency_code.clone(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordParams {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub amount: i64,
    pub attachment: Option<String>,
}

impl RecordParams {
    fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() || self.amount < 0 {
            return Err(Error::invalid());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordStore {
    records: DashMap<Id, Record>,
    // Keyed by record id, oldest first
    logs: DashMap<Id, Vec<RecordLog>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, record: Record) {
        self.append_log(&record);
        self.records.insert(record.id, record);
    }

    fn append_log(&self, record: &Record) {
        self.logs
            .entry(record.id)
            .or_default()
            .push(RecordLog::from(record));
    }

    /// Applies `change` to the record if it belongs to `user_id` and `kind`.
    fn modify<F>(&self, user_id: Id, kind: RecordKind, id: Id, change: F) -> Result<Record, Error>
    where
        F: FnOnce(&mut Record),
    {
        match self.records.get_mut(&id) {
            Some(mut record) if record.user_id == user_id && record.kind == kind => {
                change(&mut record);
                record.updated_at = Utc::now();
                Ok(record.clone())
            }
            _ => Err(Error::not_found()),
        }
    }

    fn remove(&self, user_id: Id, kind: RecordKind, id: Id) -> Result<Record, Error> {
        self.records
            .remove_if(&id, |_, record| record.user_id == user_id && record.kind == kind)
            .map(|(_, record)| {
                self.logs.remove(&record.id);
                record
            })
            .ok_or_else(Error::not_found)
    }
}

/// Announces a committed mutation to everyone listening for `user_id`.
async fn publish_committed(
    publisher: &EventPublisher,
    user_id: Id,
    record_id: Id,
    mutation: Mutation,
) {
    publisher
        .publish(DomainEvent::RecordMutated {
            user_id,
            record_id,
            mutation,
        })
        .await;
}

pub async fn create(
    store: &RecordStore,
    publisher: &EventPublisher,
    user_id: Id,
    kind: RecordKind,
    params: RecordParams,
) -> Result<Record, Error> {
    params.validate()?;
    debug!("New {kind} to be inserted: {params:?}");

    let now = Utc::now();
    let record = Record {
        id: Id::new_v4(),
        user_id,
        kind,
        title: params.title,
        description: params.description,
        amount: params.amount,
        currency_code: CURRENCY_CODE.to_string(),
        attachment: params.attachment,
        created_at: now,
        updated_at: now,
    };
    store.insert(record.clone());

    publish_committed(publisher, user_id, record.id, Mutation::Created).await;
    Ok(record)
}

pub fn find_by_id(
    store: &RecordStore,
    user_id: Id,
    kind: RecordKind,
    id: Id,
) -> Result<Record, Error> {
    store
        .records
        .get(&id)
        .filter(|record| record.user_id == user_id && record.kind == kind)
        .map(|record| record.clone())
        .ok_or_else(Error::not_found)
}

/// All of a user's records of one kind, newest first.
pub fn find_by_user(store: &RecordStore, user_id: Id, kind: RecordKind) -> Vec<Record> {
    let mut records: Vec<Record> = store
        .records
        .iter()
        .filter(|record| record.user_id == user_id && record.kind == kind)
        .map(|record| record.clone())
        .collect();
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

/// Edit history of one of a user's records, newest first.
pub fn find_logs(
    store: &RecordStore,
    user_id: Id,
    kind: RecordKind,
    id: Id,
) -> Result<Vec<RecordLog>, Error> {
    find_by_id(store, user_id, kind, id)?;

    let mut logs = store
        .logs
        .get(&id)
        .map(|logs| logs.clone())
        .unwrap_or_default();
    logs.reverse();
    Ok(logs)
}

pub async fn update(
    store: &RecordStore,
    publisher: &EventPublisher,
    user_id: Id,
    kind: RecordKind,
    id: Id,
    params: RecordParams,
) -> Result<Record, Error> {
    params.validate()?;

    let record = store.modify(user_id, kind, id, |record| {
        debug!("Existing {kind} to be updated: {record:?}");
        record.title = params.title;
        record.description = params.description;
        record.amount = params.amount;
        record.attachment = params.attachment;
    })?;
    store.append_log(&record);

    publish_committed(publisher, user_id, id, Mutation::Updated).await;
    Ok(record)
}

pub async fn delete(
    store: &RecordStore,
    publisher: &EventPublisher,
    user_id: Id,
    kind: RecordKind,
    id: Id,
) -> Result<(), Error> {
    let record = store.remove(user_id, kind, id)?;
    if let Some(attachment) = &record.attachment {
        debug!("Dropping attachment {attachment} of deleted {kind} {id}");
    }

    publish_committed(publisher, user_id, id, Mutation::Deleted).await;
    Ok(())
}

pub async fn remove_attachment(
    store: &RecordStore,
    publisher: &EventPublisher,
    user_id: Id,
    kind: RecordKind,
    id: Id,
) -> Result<Record, Error> {
    let record = store.modify(user_id, kind, id, |record| {
        record.attachment = None;
    })?;

    publish_committed(publisher, user_id, id, Mutation::AttachmentRemoved).await;
    Ok(record)
}

use crate::error::{EntityErrorKind, Error};
use crate::Id;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct User {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Process-local user accounts, indexed by id and by normalized email.
#[derive(Default)]
pub struct UserStore {
    users: DashMap<Id, User>,
    emails: DashMap<String, Id>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_id(&self, id: Id) -> Result<User, Error> {
        self.users
            .get(&id)
            .map(|user| user.clone())
            .ok_or_else(Error::not_found)
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let id = *self.emails.get(&normalize_email(email))?;
        self.users.get(&id).map(|user| user.clone())
    }
}

/// Creates an account. Names are trimmed, emails trimmed and lowercased, and
/// an email may only be registered once.
pub fn register(store: &UserStore, registration: Registration) -> Result<User, Error> {
    let name = registration.name.trim().to_string();
    let email = normalize_email(&registration.email);

    if name.is_empty() || email.is_empty() || registration.password.is_empty() {
        return Err(Error::invalid());
    }

    let now = Utc::now();
    let user = User {
        id: Id::new_v4(),
        name,
        email: email.clone(),
        password: generate_hash(registration.password),
        created_at: now,
        updated_at: now,
    };

    match store.emails.entry(email) {
        Entry::Occupied(existing) => {
            warn!("User already exists with email: {}", existing.key());
            Err(Error::entity(EntityErrorKind::Conflict))
        }
        Entry::Vacant(vacant) => {
            store.users.insert(user.id, user.clone());
            vacant.insert(user.id);
            debug!("Registered new user {}", user.id);
            Ok(user)
        }
    }
}

/// Verifies credentials. Unknown emails and wrong passwords are both
/// `Unauthenticated`.
pub fn authenticate(store: &UserStore, creds: &Credentials) -> Result<User, Error> {
    let user = match store.find_by_email(&creds.email) {
        Some(user) => user,
        None => {
            warn!("Authentication failed, no user for email: {:?}", creds.email);
            return Err(Error::unauthenticated());
        }
    };

    verify_password(&creds.password, &user.password)?;
    Ok(user)
}

pub fn verify_password(password_to_verify: &str, password_hash: &str) -> Result<(), Error> {
    match password_auth::verify_password(password_to_verify, password_hash) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::unauthenticated()),
    }
}

pub fn generate_hash(password: String) -> String {
    password_auth::generate_hash(password)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

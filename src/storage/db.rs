use redb::{Database as RedbDatabase, ReadTransaction, ReadableTable, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use chrono::{DateTime, Utc};

use super::models::{PixelRequest, RequestStatus, Role, Session, TokenRecord, User};
use super::tables::*;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Redb(#[from] redb::Error),
    #[error("Database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
}

#[derive(Clone)]
pub struct Database {
    db: Arc<RedbDatabase>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("pixelboard.redb");
        let db = RedbDatabase::create(db_path)?;

        // Create tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_USERNAME)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(REQUESTS)?;
            let _ = write_txn.open_table(TOKENS)?;
            let _ = write_txn.open_table(USER_TOKENS)?;
            let _ = write_txn.open_table(SESSIONS)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    // ========================================================================
    // User operations
    // ========================================================================

    /// Store a new user. Both uniqueness indexes are checked inside the same
    /// write transaction as the insert, so two concurrent registrations for
    /// the same name cannot both succeed. Returns false when the username or
    /// email is already taken.
    pub fn create_user(&self, user: &User) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let created = {
            let mut username_index = write_txn.open_table(USERS_BY_USERNAME)?;
            let mut email_index = write_txn.open_table(USERS_BY_EMAIL)?;

            let taken = username_index.get(user.username.as_str())?.is_some()
                || email_index.get(user.email.as_str())?.is_some();

            if taken {
                false
            } else {
                let mut users = write_txn.open_table(USERS)?;
                let data = bincode::serialize(user)?;
                users.insert(user.id.as_str(), data.as_slice())?;
                username_index.insert(user.username.as_str(), user.id.as_str())?;
                email_index.insert(user.email.as_str(), user.id.as_str())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(created)
    }

    /// Get a user by ID
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(user_id)? {
            Some(data) => {
                let user: User = bincode::deserialize(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Look up a user by normalized username or email
    pub fn find_user_by_login(&self, login: &str) -> Result<Option<User>, DatabaseError> {
        let read_txn = self.begin_read()?;

        let user_id: Option<String> = {
            let username_index = read_txn.open_table(USERS_BY_USERNAME)?;
            match username_index.get(login)? {
                Some(id) => Some(id.value().to_string()),
                None => {
                    let email_index = read_txn.open_table(USERS_BY_EMAIL)?;
                    email_index.get(login)?.map(|id| id.value().to_string())
                }
            }
        };

        let user_id = match user_id {
            Some(id) => id,
            None => return Ok(None),
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(data) => {
                let user: User = bincode::deserialize(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Whether any admin account exists (used by startup seeding)
    pub fn any_admin(&self) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        for result in table.iter()? {
            let (_, value) = result?;
            let user: User = bincode::deserialize(value.value())?;
            if user.role == Role::Admin {
                return Ok(true);
            }
        }

        Ok(false)
    }

    // ========================================================================
    // Request operations
    // ========================================================================

    /// Store a pixel-claim request
    pub fn put_request(&self, request: &PixelRequest) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(REQUESTS)?;
            let data = bincode::serialize(request)?;
            table.insert(request.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a request by ID
    pub fn get_request(&self, request_id: &str) -> Result<Option<PixelRequest>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(REQUESTS)?;

        match table.get(request_id)? {
            Some(data) => {
                let request: PixelRequest = bincode::deserialize(data.value())?;
                Ok(Some(request))
            }
            None => Ok(None),
        }
    }

    /// Get all requests (visibility filtering happens in the lifecycle layer)
    pub fn all_requests(&self) -> Result<Vec<PixelRequest>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(REQUESTS)?;

        let mut requests = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let request: PixelRequest = bincode::deserialize(value.value())?;
            requests.push(request);
        }

        Ok(requests)
    }

    /// Overwrite a request's status and updated_at in a single write
    /// transaction. Returns the updated request, or None if the ID is
    /// unknown.
    pub fn update_request_status(
        &self,
        request_id: &str,
        status: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<PixelRequest>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(REQUESTS)?;

            let existing: Option<PixelRequest> = match table.get(request_id)? {
                Some(data) => Some(bincode::deserialize(data.value())?),
                None => None,
            };

            match existing {
                Some(mut request) => {
                    request.status = status;
                    request.updated_at = now;
                    let data = bincode::serialize(&request)?;
                    table.insert(request_id, data.as_slice())?;
                    Some(request)
                }
                None => None,
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }

    // ========================================================================
    // Token operations
    // ========================================================================

    /// Store a bearer token
    pub fn put_token(&self, record: &TokenRecord) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(TOKENS)?;
            let data = bincode::serialize(record)?;
            table.insert(record.token.as_str(), data.as_slice())?;

            // Update user_tokens index
            let mut index_table = write_txn.open_table(USER_TOKENS)?;
            let mut tokens: Vec<String> = index_table
                .get(record.user_id.as_str())?
                .map(|v| bincode::deserialize(v.value()).unwrap_or_default())
                .unwrap_or_default();

            if !tokens.contains(&record.token) {
                tokens.push(record.token.clone());
                let index_data = bincode::serialize(&tokens)?;
                index_table.insert(record.user_id.as_str(), index_data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a token record by exact token string
    pub fn get_token(&self, token: &str) -> Result<Option<TokenRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(TOKENS)?;

        match table.get(token)? {
            Some(data) => {
                let record: TokenRecord = bincode::deserialize(data.value())?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Delete a bearer token
    pub fn delete_token(&self, token: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        // First, get the token's user_id for index cleanup
        let user_id: Option<String> = {
            let table = write_txn.open_table(TOKENS)?;
            let result = table.get(token)?;
            match result {
                Some(data) => {
                    let record: TokenRecord = bincode::deserialize(data.value())?;
                    Some(record.user_id)
                }
                None => None,
            }
        };

        let deleted = match user_id {
            Some(uid) => {
                {
                    let mut table = write_txn.open_table(TOKENS)?;
                    table.remove(token)?;
                }

                // Update user_tokens index
                let tokens: Option<Vec<String>> = {
                    let index_table = write_txn.open_table(USER_TOKENS)?;
                    let result = index_table.get(uid.as_str())?;
                    match result {
                        Some(data) => Some(bincode::deserialize(data.value())?),
                        None => None,
                    }
                };

                if let Some(mut ids) = tokens {
                    ids.retain(|t| t != token);
                    let mut index_table = write_txn.open_table(USER_TOKENS)?;
                    if ids.is_empty() {
                        index_table.remove(uid.as_str())?;
                    } else {
                        let new_index_data = bincode::serialize(&ids)?;
                        index_table.insert(uid.as_str(), new_index_data.as_slice())?;
                    }
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// Delete every token belonging to a user. Returns the number removed.
    pub fn delete_tokens_for_user(&self, user_id: &str) -> Result<u64, DatabaseError> {
        let write_txn = self.begin_write()?;
        let mut deleted = 0u64;
        {
            let tokens: Vec<String> = {
                let index_table = write_txn.open_table(USER_TOKENS)?;
                let result = match index_table.get(user_id)? {
                    Some(data) => bincode::deserialize(data.value())?,
                    None => Vec::new(),
                };
                result
            };

            let mut table = write_txn.open_table(TOKENS)?;
            for token in &tokens {
                if table.remove(token.as_str())?.is_some() {
                    deleted += 1;
                }
            }

            let mut index_table = write_txn.open_table(USER_TOKENS)?;
            index_table.remove(user_id)?;
        }
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Get all tokens (for expiration cleanup)
    pub fn all_tokens(&self) -> Result<Vec<TokenRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(TOKENS)?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let record: TokenRecord = bincode::deserialize(value.value())?;
            records.push(record);
        }

        Ok(records)
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Store a session
    pub fn put_session(&self, session: &Session) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let data = bincode::serialize(session)?;
            table.insert(session.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a session by sid
    pub fn get_session(&self, session_id: &str) -> Result<Option<Session>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        match table.get(session_id)? {
            Some(data) => {
                let session: Session = bincode::deserialize(data.value())?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Delete a session
    pub fn delete_session(&self, session_id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let removed = table.remove(session_id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Get all sessions (for expiration cleanup)
    pub fn all_sessions(&self) -> Result<Vec<Session>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        let mut sessions = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let session: Session = bincode::deserialize(value.value())?;
            sessions.push(session);
        }

        Ok(sessions)
    }
}

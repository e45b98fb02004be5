use redb::TableDefinition;

/// Users: user_id -> User (bincode)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Uniqueness index: lowercase username -> user_id
pub const USERS_BY_USERNAME: TableDefinition<&str, &str> =
    TableDefinition::new("users_by_username");

/// Uniqueness index: lowercase email -> user_id
pub const USERS_BY_EMAIL: TableDefinition<&str, &str> = TableDefinition::new("users_by_email");

/// Pixel-claim requests: request_id -> PixelRequest (bincode)
pub const REQUESTS: TableDefinition<&str, &[u8]> = TableDefinition::new("requests");

/// Bearer tokens: token string -> TokenRecord (bincode)
pub const TOKENS: TableDefinition<&str, &[u8]> = TableDefinition::new("tokens");

/// Secondary index: user_id -> Vec<token> (for revoking all of a user's tokens)
pub const USER_TOKENS: TableDefinition<&str, &[u8]> = TableDefinition::new("user_tokens");

/// Server-side sessions: session id -> Session (bincode)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

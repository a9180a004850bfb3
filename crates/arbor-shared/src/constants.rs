/// Application name
pub const APP_NAME: &str = "Arbor";

/// Header carrying the asserted actor id on every request
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Name of the user the server acts as when no actor header is sent
pub const DEFAULT_USER_NAME: &str = "Zach";

/// Upper bound on a comment body in bytes (64 KiB)
pub const MAX_MESSAGE_SIZE: usize = 65_536;

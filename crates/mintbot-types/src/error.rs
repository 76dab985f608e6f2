use thiserror::Error;

/// User-correctable input errors. Handled by re-prompting; the session does
/// not advance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("token name cannot be empty")]
    EmptyName,

    #[error("token symbol cannot be empty")]
    EmptySymbol,

    #[error("description cannot be empty")]
    EmptyDescription,

    #[error("invalid supply: '{0}'")]
    InvalidSupply(String),

    #[error("invalid mint address: '{0}'")]
    InvalidMintAddress(String),
}

/// Errors from the metadata pinning collaborator.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("pinning service credentials are not configured")]
    MissingCredentials,

    #[error("failed to fetch image: {0}")]
    ImageFetch(String),

    #[error("pinning service unreachable: {0}")]
    Unreachable(String),

    #[error("pinning service rejected the credentials")]
    Unauthorized,

    #[error("pinning service returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected pinning response: {0}")]
    InvalidResponse(String),
}

/// Errors from the ledger client. Terminal for the step that raised them.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("transaction {0} was not confirmed in time")]
    ConfirmationTimeout(String),

    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("supply does not fit in base units")]
    AmountOverflow,
}

/// Required configuration is absent or malformed. Surfaced before any
/// operation is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Errors from the optional idea enhancer. Never shown to users; the idea
/// generator falls back to its template.
#[derive(Debug, Error)]
pub enum IdeaError {
    #[error("idea service unavailable: {0}")]
    Unavailable(String),

    #[error("could not parse idea: {0}")]
    Parse(String),
}

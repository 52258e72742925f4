use thiserror::Error;

/// Top-level error type for the `panos-api` crate.
///
/// Every public operation returns either its result or exactly one of these.
/// Nothing is retried and nothing is logged-and-swallowed: the first failure
/// is handed straight back to the caller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The keygen request was rejected (bad credentials, locked account).
    #[error("Authentication failed (code {code}): {message}")]
    Authentication { code: String, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The response body was not the XML shape we expected, with the raw
    /// body for debugging.
    #[error("Parse error: {message}")]
    Parse { message: String, body: String },

    // ── Caller preconditions ────────────────────────────────────────
    /// A role/scope precondition was violated. Raised before any request
    /// is sent.
    #[error("Configuration error: {0}")]
    Config(String),

    // ── Device responses ────────────────────────────────────────────
    /// A bootstrap operational command failed during session setup.
    #[error("Protocol error during {command} (code {code}): {message}")]
    Protocol {
        command: &'static str,
        code: String,
        message: String,
    },

    /// The device answered with a non-success envelope.
    #[error("error code {code}: {message}")]
    Operation {
        code: String,
        message: String,
        /// Free-text `<msg>` content from the device, when present.
        detail: Option<String>,
    },

    /// No object with this name exists in any taggable category.
    #[error("Object not found: {name}")]
    NotFound { name: String },
}

impl Error {
    /// Build an `Operation` error from an envelope's code and message,
    /// translating the code through the fixed error table.
    pub(crate) fn operation(code: Option<&str>, detail: Option<String>) -> Self {
        let code = code.unwrap_or_default().to_owned();
        let message = describe_code(&code).to_owned();
        Self::Operation {
            code,
            message,
            detail,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn parse(message: impl std::fmt::Display, body: &str) -> Self {
        Self::Parse {
            message: message.to_string(),
            body: body.to_owned(),
        }
    }

    /// Returns `true` if the device reported the target object as absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Operation { code, .. } => code == "7",
            Self::NotFound { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the API key was rejected or the session timed out,
    /// meaning a fresh `Session::connect` might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Operation { code, .. } => matches!(code.as_str(), "403" | "16" | "22"),
            _ => false,
        }
    }

    /// Extract the device error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Authentication { code, .. }
            | Self::Protocol { code, .. }
            | Self::Operation { code, .. } => Some(code),
            _ => None,
        }
    }
}

// ── Error code table ─────────────────────────────────────────────────

/// Human-readable meaning of a PAN-OS XML API response code.
///
/// Returns `None` for codes outside the documented set.
pub fn error_message(code: &str) -> Option<&'static str> {
    const INTERNAL: &str = "Internal error - Check with technical support when seeing these errors";
    const SUCCESS: &str = "Success - Command completed successfully";

    let message = match code {
        "400" => {
            "Bad request - Returned when a required parameter is missing, an illegal parameter value is used"
        }
        "403" => {
            "Forbidden - Returned for authentication or authorization errors including invalid key, insufficient admin access rights"
        }
        "1" => "Unknown command - The specific config or operational command is not recognized",
        "2" | "3" | "4" | "5" | "9" | "11" | "21" => INTERNAL,
        "6" => {
            "Bad Xpath - The xpath specified in one or more attributes of the command is invalid. Check the API browser for proper xpath values"
        }
        "7" => {
            "Object not present - Object specified by the xpath is not present. For example, entry[@name='value'] where no object with name 'value' is present"
        }
        "8" => {
            "Object not unique - For commands that operate on a single object, the specified object is not unique"
        }
        "10" => {
            "Reference count not zero - Object cannot be deleted as there are other objects that refer to it. For example, address object still in use in policy"
        }
        "12" => "Invalid object - Xpath or element values provided are not complete",
        "13" => "Operation failed - A descriptive error message is returned in the response",
        "14" => {
            "Operation not possible - Operation is not possible. For example, moving a rule up one position when it is already at the top"
        }
        "15" => {
            "Operation denied - For example, Admin not allowed to delete own account, Running a command that is not allowed on a passive device"
        }
        "16" => "Unauthorized - The API role does not have access rights to run this query",
        "17" => "Invalid command - Invalid command or parameters",
        "18" => "Malformed command - The XML is malformed",
        "19" | "20" => SUCCESS,
        "22" => "Session timed out - The session for this query timed out",
        _ => return None,
    };
    Some(message)
}

/// Like [`error_message`], falling back to a generic message for unknown codes.
pub fn describe_code(code: &str) -> &'static str {
    error_message(code).unwrap_or("Unknown error - The device returned an unrecognized error code")
}

/// Command grammar
///
/// The transport delivers user input as lines; this module parses them
/// into [`Command`] values for the dispatcher. Grammar is one command word
/// followed by whitespace-separated arguments; the last argument of
/// `find-author` may contain spaces.

use thiserror::Error;

/// A parsed user command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bind the session to a tenant: `select-tenant <key>`
    SelectTenant { key: String },

    /// Report committed records in the bound tenant: `show-count`
    ShowCount,

    /// Report the caller's user identifier: `show-identity`
    ShowIdentity,

    /// Register a tenant key (administrator): `register-tenant <key> <handle>`
    RegisterTenant { key: String, handle: String },

    /// Run recognition on an image: `submit-photo <image-ref>`
    SubmitPhoto { image_ref: String },

    /// Commit the staged record: `confirm-pending`
    ConfirmPending,

    /// Search the bound tenant by author: `find-author <pattern>`
    FindAuthor { pattern: String },

    /// Search the bound tenant by year: `find-year <year>`
    FindYear { year: i64 },

    /// Show the latest records: `recent <n>`
    Recent { limit: i64 },

    /// Show the command summary: `help`
    Help,
}

/// Command parse errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Input did not start with a known command word
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A required argument is missing
    #[error("missing argument; usage: {usage}")]
    MissingArgument { usage: &'static str },

    /// An argument did not parse
    #[error("invalid argument; usage: {usage}")]
    InvalidArgument { usage: &'static str },
}

impl Command {
    /// Parses one input line into a command
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let mut parts = line.split_whitespace();
        let word = parts.next().unwrap_or("");

        match word {
            "select-tenant" => {
                let key = parts.next().ok_or(ParseError::MissingArgument {
                    usage: "select-tenant <key>",
                })?;
                Ok(Command::SelectTenant {
                    key: key.to_string(),
                })
            }
            "show-count" => Ok(Command::ShowCount),
            "show-identity" => Ok(Command::ShowIdentity),
            "register-tenant" => {
                let usage = "register-tenant <key> <handle>";
                let key = parts.next().ok_or(ParseError::MissingArgument { usage })?;
                let handle = parts.next().ok_or(ParseError::MissingArgument { usage })?;
                Ok(Command::RegisterTenant {
                    key: key.to_string(),
                    handle: handle.to_string(),
                })
            }
            "submit-photo" => {
                let image_ref = parts.next().ok_or(ParseError::MissingArgument {
                    usage: "submit-photo <image-ref>",
                })?;
                Ok(Command::SubmitPhoto {
                    image_ref: image_ref.to_string(),
                })
            }
            "confirm-pending" => Ok(Command::ConfirmPending),
            "find-author" => {
                let pattern: Vec<&str> = parts.collect();
                if pattern.is_empty() {
                    return Err(ParseError::MissingArgument {
                        usage: "find-author <pattern>",
                    });
                }
                Ok(Command::FindAuthor {
                    pattern: pattern.join(" "),
                })
            }
            "find-year" => {
                let usage = "find-year <year>";
                let raw = parts.next().ok_or(ParseError::MissingArgument { usage })?;
                let year = raw
                    .parse()
                    .map_err(|_| ParseError::InvalidArgument { usage })?;
                Ok(Command::FindYear { year })
            }
            "recent" => {
                let usage = "recent <n>";
                let raw = parts.next().ok_or(ParseError::MissingArgument { usage })?;
                let limit: i64 = raw
                    .parse()
                    .map_err(|_| ParseError::InvalidArgument { usage })?;
                if limit < 1 {
                    return Err(ParseError::InvalidArgument { usage });
                }
                Ok(Command::Recent { limit })
            }
            "help" => Ok(Command::Help),
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }
}

/// The command summary shown by `help`
pub const HELP_TEXT: &str = "\
Commands:
  select-tenant <key>             bind this session to a tenant
  submit-photo <image-ref>        recognize a book's first page
  confirm-pending                 save the staged card
  show-count                      committed records in the bound tenant
  show-identity                   your user identifier
  find-author <pattern>           search by author
  find-year <year>                search by publication year
  recent <n>                      latest saved records
  register-tenant <key> <handle>  add a tenant (administrator only)
  help                            this summary";

/// Command dispatch
///
/// Turns `(user id, input line)` into a workflow call and a reply string.
/// This is the recovery boundary: every workflow error becomes a reply,
/// none escape. The only condition treated as operationally actionable is
/// a datastore failure, which is additionally logged at error level.

use crate::adapters::Recognizer;
use crate::commands::{Command, ParseError, HELP_TEXT};
use crate::error::WorkflowError;
use crate::workflow::CaptureWorkflow;
use inkshelf_shared::models::{BookFields, BookRecord};
use inkshelf_shared::registry::TenantHandle;
use std::sync::Arc;

/// Routes parsed commands to workflow operations
pub struct Dispatcher {
    workflow: CaptureWorkflow,
    recognizer: Arc<dyn Recognizer>,
}

impl Dispatcher {
    pub fn new(workflow: CaptureWorkflow, recognizer: Arc<dyn Recognizer>) -> Self {
        Dispatcher {
            workflow,
            recognizer,
        }
    }

    /// Handles one input line and returns the reply
    pub async fn handle_line(&self, user_id: &str, line: &str) -> String {
        match Command::parse(line) {
            Ok(command) => self.dispatch(user_id, command).await,
            Err(err) => parse_reply(err),
        }
    }

    async fn dispatch(&self, user_id: &str, command: Command) -> String {
        let result = match command {
            Command::SelectTenant { key } => self.select_tenant(user_id, &key).await,
            Command::ShowCount => self.show_count(user_id).await,
            Command::ShowIdentity => Ok(format!("Your user id: {}", user_id)),
            Command::RegisterTenant { key, handle } => {
                self.register_tenant(user_id, &key, &handle).await
            }
            Command::SubmitPhoto { image_ref } => self.submit_photo(user_id, &image_ref).await,
            Command::ConfirmPending => self.confirm_pending(user_id).await,
            Command::FindAuthor { pattern } => {
                render_records(self.workflow.find_by_author(user_id, &pattern).await)
            }
            Command::FindYear { year } => {
                render_records(self.workflow.find_by_year(user_id, year).await)
            }
            Command::Recent { limit } => render_records(self.workflow.recent(user_id, limit).await),
            Command::Help => Ok(HELP_TEXT.to_string()),
        };

        result.unwrap_or_else(|err| error_reply(user_id, err))
    }

    async fn select_tenant(&self, user_id: &str, key: &str) -> Result<String, WorkflowError> {
        self.workflow.bind_tenant(user_id, key).await?;
        Ok(format!(
            "Connected to tenant {}. Send submit-photo <image-ref> to stage a book.",
            key
        ))
    }

    async fn show_count(&self, user_id: &str) -> Result<String, WorkflowError> {
        let count = self.workflow.book_count(user_id).await?;
        Ok(format!("The tenant holds {} saved book(s).", count))
    }

    async fn register_tenant(
        &self,
        caller_id: &str,
        key: &str,
        handle: &str,
    ) -> Result<String, WorkflowError> {
        let handle = normalize_handle(handle);
        self.workflow
            .register_tenant(caller_id, key, &handle)
            .await?;
        Ok(format!("Key {} registered with datastore {}.", key, handle))
    }

    async fn submit_photo(&self, user_id: &str, image_ref: &str) -> Result<String, WorkflowError> {
        let fields = self
            .recognizer
            .recognize(image_ref)
            .await
            .map_err(|e| WorkflowError::RecognitionFailed(e.to_string()))?;

        let pending = self
            .workflow
            .stage_recognition(user_id, fields, image_ref)
            .await?;

        Ok(format!(
            "{}\n\nSend confirm-pending within the hour to save this card.",
            render_card(&pending.fields)
        ))
    }

    async fn confirm_pending(&self, user_id: &str) -> Result<String, WorkflowError> {
        let record = self.workflow.confirm_pending(user_id).await?;
        Ok(format!("Saved \"{}\" to the tenant.", record.title))
    }
}

/// Datastore handles get a `.db` suffix if the administrator left it off
fn normalize_handle(handle: &str) -> TenantHandle {
    if handle.ends_with(".db") {
        TenantHandle::new(handle)
    } else {
        TenantHandle::new(format!("{}.db", handle))
    }
}

fn parse_reply(err: ParseError) -> String {
    match err {
        ParseError::UnknownCommand(_) => {
            format!("{}. Send help for the command list.", err)
        }
        _ => err.to_string(),
    }
}

fn error_reply(user_id: &str, err: WorkflowError) -> String {
    match &err {
        WorkflowError::StorageUnavailable(detail) => {
            tracing::error!(user_id, detail = %detail, "tenant datastore failure");
        }
        other => {
            tracing::debug!(user_id, error = %other, "workflow operation rejected");
        }
    }
    err.user_message()
}

fn render_card(fields: &BookFields) -> String {
    format!(
        "Author: {}\nTitle: {}\nYear: {}\nCategory: {}\nPublisher: {}",
        fields.author, fields.title, fields.publication_year, fields.category, fields.publisher
    )
}

fn render_records(result: Result<Vec<BookRecord>, WorkflowError>) -> Result<String, WorkflowError> {
    let records = result?;
    if records.is_empty() {
        return Ok("Nothing found.".to_string());
    }

    let cards: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "Author: {}\nTitle: {}\nYear: {}\nCategory: {}\nPublisher: {}",
                r.author, r.title, r.publication_year, r.category, r.publisher
            )
        })
        .collect();
    Ok(cards.join("\n\n"))
}

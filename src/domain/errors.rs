use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No recipients found")]
    NoRecipients,
    #[error("SMTP configuration not found: {0}")]
    TransportNotFound(String),
    #[error("SMTP configuration invalid: {id} is missing {field}")]
    TransportInvalid { id: String, field: &'static str },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

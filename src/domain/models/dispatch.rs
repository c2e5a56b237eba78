use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from_address: String,
    /// Display name, kept apart from the address so it never has to be
    /// re-parsed out of a mailbox string.
    pub from_name: Option<String>,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub email: String,
    pub success: bool,
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn sent(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(email: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub total: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    pub fn from_outcomes(mut outcomes: Vec<DispatchOutcome>) -> Self {
        outcomes.sort_by(|a, b| a.email.cmp(&b.email));
        let success_count = outcomes.iter().filter(|o| o.success).count();
        Self {
            total: outcomes.len(),
            success_count,
            fail_count: outcomes.len() - success_count,
            outcomes,
        }
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{
    errors::DispatchError,
    models::{Attributes, Audience, AudienceSource, Contact, FormSubmission, Recipient, attribute_value},
    repositories::{ContactRepository, FormRepository},
    value_objects::NormalizedEmail,
};

/// Field names probed, in order, for the address of a form lead.
const EMAIL_FIELDS: [&str; 7] = ["email", "Email", "EMAIL", "e-mail", "E-mail", "mail", "Mail"];
const NAME_FIELDS: [&str; 6] = ["name", "Name", "NAME", "fullName", "full_name", "Full Name"];

pub struct AudienceResolver {
    contacts: Arc<dyn ContactRepository>,
    forms: Arc<dyn FormRepository>,
}

impl AudienceResolver {
    pub fn new(contacts: Arc<dyn ContactRepository>, forms: Arc<dyn FormRepository>) -> Self {
        Self { contacts, forms }
    }

    /// Static lists are merged before form leads, so a lead's attributes win
    /// over a contact's for the same address (except an empty name).
    pub async fn resolve(
        &self,
        project_id: Uuid,
        sources: &[AudienceSource],
    ) -> Result<Audience, DispatchError> {
        if sources.is_empty() {
            return Err(DispatchError::NoRecipients);
        }

        let mut list_ids = Vec::new();
        let mut form_names = Vec::new();
        for source in sources {
            match source {
                AudienceSource::StaticList(id) => list_ids.push(id.clone()),
                AudienceSource::DerivedLead(name) => form_names.push(name.as_str()),
            }
        }

        let mut audience = Audience::new();

        if !list_ids.is_empty() {
            let contacts = self.contacts.list_by_lists(project_id, &list_ids).await?;
            for contact in &contacts {
                if let Some((email, attributes)) = contact_entry(contact) {
                    merge(&mut audience, email, attributes);
                }
            }
        }

        if !form_names.is_empty() {
            let form_ids = self.lead_form_ids(project_id, &form_names).await?;
            if !form_ids.is_empty() {
                let submissions = self.forms.list_submissions(project_id, &form_ids).await?;
                for submission in &submissions {
                    if let Some((email, attributes)) = lead_entry(submission) {
                        merge(&mut audience, email, attributes);
                    }
                }
            }
        }

        if audience.is_empty() {
            return Err(DispatchError::NoRecipients);
        }

        tracing::debug!(
            project_id = %project_id,
            recipients = audience.len(),
            "audience resolved"
        );

        Ok(audience)
    }

    /// Unknown form names are skipped.
    async fn lead_form_ids(
        &self,
        project_id: Uuid,
        names: &[&str],
    ) -> Result<Vec<Uuid>, DispatchError> {
        let forms = self.forms.list_forms(project_id).await?;
        let by_name: HashMap<&str, Uuid> = forms.iter().map(|f| (f.name.as_str(), f.id)).collect();

        let mut seen = HashSet::new();
        Ok(names
            .iter()
            .filter_map(|name| by_name.get(name).copied())
            .filter(|id| seen.insert(*id))
            .collect())
    }
}

fn merge(audience: &mut Audience, email: NormalizedEmail, attributes: Attributes) {
    audience
        .entry(email.clone())
        .or_insert_with(|| Recipient::new(email))
        .absorb(attributes);
}

fn contact_entry(contact: &Contact) -> Option<(NormalizedEmail, Attributes)> {
    let email = NormalizedEmail::parse(&contact.email)?;

    let mut attributes = Attributes::new();
    attributes.insert("name".to_string(), contact.name.clone().unwrap_or_default());
    attributes.insert("email".to_string(), email.to_string());
    extend_with_fields(&mut attributes, &contact.custom_fields);

    Some((email, attributes))
}

fn lead_entry(submission: &FormSubmission) -> Option<(NormalizedEmail, Attributes)> {
    let email = probe(&submission.data, &EMAIL_FIELDS).and_then(NormalizedEmail::parse)?;
    let name = probe(&submission.data, &NAME_FIELDS).unwrap_or_default();

    let mut attributes = Attributes::new();
    attributes.insert("name".to_string(), name.trim().to_string());
    attributes.insert("email".to_string(), email.to_string());
    extend_with_fields(&mut attributes, &submission.data);

    Some((email, attributes))
}

/// First candidate holding a non-blank string.
fn probe<'a>(data: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a str> {
    candidates.iter().find_map(|field| {
        data.get(*field)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    })
}

fn extend_with_fields(attributes: &mut Attributes, fields: &Map<String, Value>) {
    for (key, value) in fields {
        attributes.insert(key.clone(), attribute_value(value));
    }
}

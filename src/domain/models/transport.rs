use serde::{Deserialize, Serialize};

use crate::domain::errors::DispatchError;

/// Transport ids carrying this marker live in the shared administrative
/// credential store; all others belong to the caller.
pub const SHARED_TRANSPORT_PREFIX: &str = "admin_";

pub const IMPLICIT_TLS_PORT: u16 = 465;
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum TransportRef {
    Shared(String),
    Owned(String),
}

impl TransportRef {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(SHARED_TRANSPORT_PREFIX) {
            Some(id) => TransportRef::Shared(id.to_string()),
            None => TransportRef::Owned(raw.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            TransportRef::Shared(id) | TransportRef::Owned(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSecurity {
    ImplicitTls,
    StartTls,
}

/// SMTP settings as stored; any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredTransport {
    pub id: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: Option<String>,
    pub from_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender_address: String,
    pub sender_name: Option<String>,
}

impl TransportConfig {
    pub fn security(&self) -> TransportSecurity {
        if self.port == IMPLICIT_TLS_PORT {
            TransportSecurity::ImplicitTls
        } else {
            TransportSecurity::StartTls
        }
    }

    /// Display name for the `From` header, `None` when blank.
    pub fn display_name(&self) -> Option<&str> {
        self.sender_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

impl TryFrom<StoredTransport> for TransportConfig {
    type Error = DispatchError;

    fn try_from(stored: StoredTransport) -> Result<Self, Self::Error> {
        let id = stored.id;
        let require = |value: Option<String>, field: &'static str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DispatchError::TransportInvalid {
                    id: id.clone(),
                    field,
                })
        };

        let host = require(stored.host, "host")?;
        let username = require(stored.username, "username")?;
        let password = require(stored.password, "password")?;
        let sender_address = stored
            .from_email
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| username.clone());

        Ok(Self {
            host,
            port: stored.port.unwrap_or(DEFAULT_SMTP_PORT),
            username,
            password,
            sender_address,
            sender_name: stored.from_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> StoredTransport {
        StoredTransport {
            id: "smtp-1".to_string(),
            host: Some("smtp.example.com".to_string()),
            port: Some(465),
            username: Some("mailer@example.com".to_string()),
            password: Some("secret".to_string()),
            from_email: None,
            from_name: Some("Acme".to_string()),
        }
    }

    #[test]
    fn admin_prefix_selects_shared_scope() {
        assert_eq!(
            TransportRef::parse("admin_main"),
            TransportRef::Shared("main".to_string())
        );
        assert_eq!(
            TransportRef::parse("my-smtp"),
            TransportRef::Owned("my-smtp".to_string())
        );
    }

    #[test]
    fn security_follows_port() {
        let mut config = TransportConfig::try_from(stored()).unwrap();
        assert_eq!(config.security(), TransportSecurity::ImplicitTls);

        config.port = 587;
        assert_eq!(config.security(), TransportSecurity::StartTls);

        config.port = 25;
        assert_eq!(config.security(), TransportSecurity::StartTls);
    }

    #[test]
    fn sender_defaults_to_username() {
        let config = TransportConfig::try_from(stored()).unwrap();
        assert_eq!(config.sender_address, "mailer@example.com");
        assert_eq!(config.display_name(), Some("Acme"));
    }

    #[test]
    fn blank_display_name_is_dropped() {
        let config = TransportConfig::try_from(StoredTransport {
            from_name: Some("   ".to_string()),
            ..stored()
        })
        .unwrap();
        assert_eq!(config.display_name(), None);
    }

    #[test]
    fn missing_port_defaults_to_submission_port() {
        let config = TransportConfig::try_from(StoredTransport {
            port: None,
            ..stored()
        })
        .unwrap();
        assert_eq!(config.port, DEFAULT_SMTP_PORT);
    }

    #[test]
    fn blank_credentials_are_invalid() {
        let err = TransportConfig::try_from(StoredTransport {
            password: Some("  ".to_string()),
            ..stored()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::TransportInvalid {
                field: "password",
                ..
            }
        ));

        let err = TransportConfig::try_from(StoredTransport {
            host: None,
            ..stored()
        })
        .unwrap_err();
        assert!(matches!(err, DispatchError::TransportInvalid { field: "host", .. }));
    }
}

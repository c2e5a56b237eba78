use std::env::var;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    Smtp,
    Log,
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub mail_backend: MailBackend,
    pub dispatch_concurrency: usize,
    pub send_timeout: Duration,
    /// Limit for establishing the SMTP connection, kept below `send_timeout`.
    pub smtp_connect_timeout: Duration,
    pub audit_buffer: usize,
    /// `None` when the internal poller is disabled.
    pub scheduler_interval: Option<Duration>,
    pub stale_job_after: Duration,
    pub shutdown_grace: Duration,
}

impl Config {
    pub fn try_parse() -> Result<Config, &'static str> {
        let _ = dotenv();
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, &'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let send_timeout = Duration::from_secs(optional(
            &lookup,
            "SEND_TIMEOUT_SECONDS",
            30,
            "An error occured while parsing SEND_TIMEOUT_SECONDS env param",
        )?);
        let smtp_connect_timeout = Duration::from_secs(optional(
            &lookup,
            "SMTP_CONNECT_TIMEOUT_SECONDS",
            10,
            "An error occured while parsing SMTP_CONNECT_TIMEOUT_SECONDS env param",
        )?);
        if smtp_connect_timeout >= send_timeout {
            return Err("SMTP_CONNECT_TIMEOUT_SECONDS must be lower than SEND_TIMEOUT_SECONDS");
        }

        Ok(Config {
            port: lookup("PORT")
                .ok_or("An error occured while getting PORT env param")?
                .parse::<u16>()
                .map_err(|_| "An error occured while parsing PORT env param")?,
            scheme: lookup("SCHEME").ok_or("An error occured while getting SCHEME env param")?,
            host: lookup("HOST").ok_or("An error occured while getting HOST env param")?,
            database_url: lookup("DATABASE_URL")
                .ok_or("An error occured while getting DATABASE_URL env param")?,
            database_max_connections: optional(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                10,
                "An error occured while parsing DATABASE_MAX_CONNECTIONS env param",
            )?,
            mail_backend: match lookup("MAIL_BACKEND").as_deref() {
                None | Some("smtp") => MailBackend::Smtp,
                Some("log") => MailBackend::Log,
                Some(_) => return Err("MAIL_BACKEND must be either smtp or log"),
            },
            dispatch_concurrency: optional::<usize, _>(
                &lookup,
                "DISPATCH_CONCURRENCY",
                16,
                "An error occured while parsing DISPATCH_CONCURRENCY env param",
            )?
            .max(1),
            send_timeout,
            smtp_connect_timeout,
            audit_buffer: optional(
                &lookup,
                "AUDIT_BUFFER",
                1024,
                "An error occured while parsing AUDIT_BUFFER env param",
            )?,
            scheduler_interval: match optional::<u64, _>(
                &lookup,
                "SCHEDULER_INTERVAL_SECONDS",
                60,
                "An error occured while parsing SCHEDULER_INTERVAL_SECONDS env param",
            )? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            stale_job_after: Duration::from_secs(optional(
                &lookup,
                "STALE_JOB_SECONDS",
                3600,
                "An error occured while parsing STALE_JOB_SECONDS env param",
            )?),
            shutdown_grace: Duration::from_secs(optional(
                &lookup,
                "SHUTDOWN_GRACE_SECONDS",
                10,
                "An error occured while parsing SHUTDOWN_GRACE_SECONDS env param",
            )?),
        })
    }

    pub fn server_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

fn optional<T, F>(lookup: &F, key: &str, default: T, message: &'static str) -> Result<T, &'static str>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| message),
        None => Ok(default),
    }
}

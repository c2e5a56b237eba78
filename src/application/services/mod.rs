pub mod audience;
pub mod audit_trail;
pub mod mail;
pub mod personalizer;
pub mod transport;

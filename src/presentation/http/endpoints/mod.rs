pub mod emails;
pub mod health;
pub mod jobs;
pub mod root;

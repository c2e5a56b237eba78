pub mod log;
pub mod recording;
pub mod smtp;

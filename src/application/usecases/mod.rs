pub mod process_due_jobs;
pub mod send_now;

pub mod bulk_dispatch;
pub mod dispatch_coordinator;

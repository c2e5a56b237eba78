pub mod audience;
pub mod dispatch;
pub mod job;
pub mod template;
pub mod transport;

pub use audience::{
    Attributes, Audience, AudienceSource, Contact, Form, FormSubmission, Recipient,
    attribute_value,
};
pub use dispatch::{DispatchOutcome, DispatchReport, OutgoingEmail};
pub use job::{INTERRUPTED_MESSAGE, JobCompletion, JobStatus, ScheduledJob};
pub use template::MessageTemplate;
pub use transport::{
    StoredTransport, TransportConfig, TransportRef, TransportSecurity,
};

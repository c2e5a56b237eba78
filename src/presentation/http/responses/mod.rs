use poem_openapi::Object;

#[derive(Object, Debug, PartialEq, Eq)]
pub struct SendEmailsResponseDto {
    pub total: u32,
    pub sent: u32,
    pub failed: u32,
}

#[derive(Object, Debug, PartialEq, Eq)]
pub struct ProcessJobsResponseDto {
    pub processed: u32,
    pub sent: u32,
    pub failed: u32,
    /// Jobs that ran but whose final status could not be stored.
    pub unrecorded: u32,
    /// Jobs left in processing by an earlier run and now marked failed.
    pub expired: u32,
}

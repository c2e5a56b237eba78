use poem_openapi::Object;
use uuid::Uuid;

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct SendEmailsRequestDto {
    pub template_id: Uuid,
    #[oai(validator(min_length = 1))]
    pub transport_id: String,
    #[oai(validator(min_length = 1, max_length = 998))]
    pub subject: String,
    pub body: String,
    #[oai(default)]
    pub audience_source_ids: Vec<String>,
}

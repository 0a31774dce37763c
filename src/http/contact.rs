use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use super::{ApiJson, MessageResponse};
use crate::error::{AppError, Result};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub newsletter: Option<bool>,
    pub contact_method: Option<String>,
    pub priority: Option<String>,
}

impl ContactForm {
    fn missing_fields(&self) -> Vec<&'static str> {
        [("name", &self.name), ("email", &self.email), ("subject", &self.subject), ("message", &self.message)]
            .into_iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(field, _)| field)
            .collect()
    }
}

#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "Contact",
    request_body = ContactForm,
    responses(
        (status = 200, description = "Message accepted", body = MessageResponse),
        (status = 400, description = "Required fields missing", body = crate::error::ErrorResponse)
    )
)]
pub async fn submit(ApiJson(form): ApiJson<ContactForm>) -> Result<MessageResponse> {
    let missing = form.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!("Missing required fields: {}", missing.join(", "))));
    }

    info!(
        name = form.name.as_deref().unwrap_or_default(),
        email = form.email.as_deref().unwrap_or_default(),
        subject = form.subject.as_deref().unwrap_or_default(),
        newsletter = form.newsletter.unwrap_or(false),
        contact_method = form.contact_method.as_deref().unwrap_or("email"),
        priority = form.priority.as_deref().unwrap_or("normal"),
        "contact form submission"
    );
    Ok(MessageResponse::new("Message sent successfully! We will get back to you soon."))
}

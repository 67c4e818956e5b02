use crate::config::DeliveryConfig;
use crate::error::ReportError;
use crate::window::ReportWindow;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fs;
use std::path::Path;

/// Package the report as an attachment and send it to the recipient list.
///
/// A failure here does not invalidate the already-written report artifact;
/// the error is surfaced so the operator can resend by hand.
pub fn deliver(
    config: &DeliveryConfig,
    window: &ReportWindow,
    report: &Path,
) -> Result<(), ReportError> {
    let wrap = |error: &dyn std::fmt::Display| ReportError::Delivery(error.to_string());

    let sender: Mailbox = config.sender.parse().map_err(|e| wrap(&e))?;
    let mut builder = Message::builder()
        .from(sender)
        .subject(config.subject.clone());
    for recipient in &config.recipients {
        builder = builder.to(recipient.parse().map_err(|e| wrap(&e))?);
    }

    let payload = fs::read(report)
        .map_err(|e| ReportError::Delivery(format!("unreadable report {report:?}: {e}")))?;
    let filename = report
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.pdf".to_string());
    let content_type = ContentType::parse("application/pdf").map_err(|e| wrap(&e))?;

    let message = builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body_text(window)))
                .singlepart(Attachment::new(filename).body(payload, content_type)),
        )
        .map_err(|e| wrap(&e))?;

    let transport = SmtpTransport::starttls_relay(&config.smtp_host)
        .map_err(|e| wrap(&e))?
        .port(config.smtp_port)
        .credentials(Credentials::new(
            config.sender.clone(),
            config.password.clone(),
        ))
        .build();

    transport.send(&message).map_err(|e| wrap(&e))?;

    Ok(())
}

fn body_text(window: &ReportWindow) -> String {
    let (start, end) = window.date_labels();
    format!(
        "This is an autogenerated email. Please find attached the deviation report \
         for the data generated from {start} to {end}.\n\n\
         If you have any questions or need further information, please do not \
         hesitate to contact us.\n"
    )
}

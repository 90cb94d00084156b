//! Email content for enquiry notifications, follow-ups and replies.

use std::fmt::Write;

use super::mailer::OutgoingEmail;
use crate::enquiry::Enquiry;

/// Business details merged into outgoing mail.
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    /// Name used in greetings and signatures.
    pub business_name: String,
    /// Inbox that receives new-lead alerts.
    pub alert_to: String,
    /// Reply-To for mail sent to leads.
    pub reply_to: Option<String>,
    /// Public site URL, linked from mail sent to leads.
    pub site_url: Option<String>,
}

impl NotificationSettings {
    fn to_lead(&self, email: OutgoingEmail) -> OutgoingEmail {
        match &self.reply_to {
            Some(address) => email.reply_to(address.clone()),
            None => email,
        }
    }

    fn signature(&self) -> String {
        match &self.site_url {
            Some(url) => format!("{}\n{url}", self.business_name),
            None => self.business_name.clone(),
        }
    }
}

/// Internal alert for a newly submitted enquiry.
#[must_use]
pub fn lead_alert(enquiry: &Enquiry, settings: &NotificationSettings) -> OutgoingEmail {
    let subject = format!("[{}] New enquiry from {}", enquiry.priority, enquiry.name);

    let mut text = String::new();
    let _ = writeln!(text, "Priority: {}", enquiry.priority);
    let _ = writeln!(text, "Name: {}", enquiry.name);
    let _ = writeln!(text, "Email: {}", enquiry.email);
    let _ = writeln!(text, "Phone: {}", enquiry.phone.as_deref().unwrap_or("-"));
    let _ = writeln!(text, "Service: {}", enquiry.service.as_deref().unwrap_or("-"));
    let _ = writeln!(text, "Budget: {}", enquiry.budget.as_deref().unwrap_or("-"));
    let _ = writeln!(text, "Enquiry #: {}", enquiry.id);
    text.push('\n');
    text.push_str(&enquiry.message);

    let mut html = String::from("<table>");
    for (label, value) in [
        ("Priority", enquiry.priority.as_str()),
        ("Name", enquiry.name.as_str()),
        ("Email", enquiry.email.as_str()),
        ("Phone", enquiry.phone.as_deref().unwrap_or("-")),
        ("Service", enquiry.service.as_deref().unwrap_or("-")),
        ("Budget", enquiry.budget.as_deref().unwrap_or("-")),
    ] {
        let _ = write!(
            html,
            "<tr><th align=\"left\">{label}</th><td>{}</td></tr>",
            escape_html(value)
        );
    }
    html.push_str("</table>");
    let _ = write!(html, "<p>{}</p>", paragraphs(&enquiry.message));

    OutgoingEmail::new(&settings.alert_to, subject, text)
        .html(html)
        .reply_to(enquiry.email.clone())
}

/// Confirmation sent to the person who submitted an enquiry.
#[must_use]
pub fn enquiry_confirmation(enquiry: &Enquiry, settings: &NotificationSettings) -> OutgoingEmail {
    let subject = format!("Thanks for your enquiry, {}", enquiry.first_name());
    let service = enquiry
        .service
        .as_deref()
        .map_or_else(String::new, |s| format!(" about {s}"));

    let text = format!(
        "Hi {},\n\nThanks for getting in touch{service}. We have received your enquiry \
         and one of our team will be in contact within one business day.\n\n{}",
        enquiry.first_name(),
        settings.signature(),
    );
    let html = format!(
        "<p>Hi {},</p><p>Thanks for getting in touch{}. We have received your enquiry \
         and one of our team will be in contact within one business day.</p><p>{}</p>",
        escape_html(enquiry.first_name()),
        escape_html(&service),
        paragraphs(&settings.signature()),
    );

    settings.to_lead(OutgoingEmail::new(&enquiry.email, subject, text).html(html))
}

/// Follow-up for a stale high-value enquiry.
#[must_use]
pub fn follow_up(enquiry: &Enquiry, settings: &NotificationSettings) -> OutgoingEmail {
    let subject = format!("Following up on your enquiry, {}", enquiry.first_name());
    let topic = enquiry
        .service
        .as_deref()
        .map_or_else(|| "your property search".to_string(), str::to_string);

    let text = format!(
        "Hi {},\n\nWe wanted to check in about {topic}. If you would like to talk \
         through your plans, simply reply to this email and we will arrange a time \
         that suits you.\n\n{}",
        enquiry.first_name(),
        settings.signature(),
    );
    let html = format!(
        "<p>Hi {},</p><p>We wanted to check in about {}. If you would like to talk \
         through your plans, simply reply to this email and we will arrange a time \
         that suits you.</p><p>{}</p>",
        escape_html(enquiry.first_name()),
        escape_html(&topic),
        paragraphs(&settings.signature()),
    );

    settings.to_lead(OutgoingEmail::new(&enquiry.email, subject, text).html(html))
}

/// Admin reply to an enquiry. The body is merged with [`render`] first.
#[must_use]
pub fn reply(
    enquiry: &Enquiry,
    subject: &str,
    body: &str,
    settings: &NotificationSettings,
) -> OutgoingEmail {
    let text = render(body, enquiry);
    let html = paragraphs(&text);

    settings.to_lead(OutgoingEmail::new(&enquiry.email, subject, text).html(html))
}

/// Merge enquiry fields into a template.
///
/// Supports `{{name}}`, `{{first_name}}`, `{{email}}` and `{{service}}`.
/// Unknown placeholders are left as written.
#[must_use]
pub fn render(template: &str, enquiry: &Enquiry) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after[..end].trim();
        match key {
            "name" => out.push_str(&enquiry.name),
            "first_name" => out.push_str(enquiry.first_name()),
            "email" => out.push_str(&enquiry.email),
            "service" => out.push_str(enquiry.service.as_deref().unwrap_or("")),
            _ => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text and keep its line breaks.
fn paragraphs(s: &str) -> String {
    escape_html(s).replace('\n', "<br>")
}

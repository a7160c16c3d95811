//! Rejection context extraction using mailparse.
//!
//! A rejection notice needs to know who sent the email, where it was sent
//! and what it was about. Those come from the raw MIME headers.

use anyhow::{bail, Context, Result};
use mailparse::{addrparse_header, parse_mail, MailAddr, MailHeaderMap, ParsedMail};
use tracing::info;

use super::outcome::{TemplateArgs, ARG_DESTINATION, ARG_FORMER_TITLE, ARG_SITE_NAME};

/// Everything a rejection notice is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionContext {
    /// Address the notice is delivered to
    pub sender: String,
    /// Addresses the original email was sent to
    pub destinations: Vec<String>,
    /// Subject of the original email
    pub subject: String,
    /// Site display name
    pub site_name: String,
}

impl RejectionContext {
    /// Build a context from the raw MIME text of the rejected email.
    pub fn from_raw_mime(raw_mime: &str, site_name: &str) -> Result<Self> {
        let mail = parse_mail(raw_mime.as_bytes()).context("Failed to parse email")?;

        let sender = match header_addresses(&mail, "From")?.into_iter().next() {
            Some(sender) => sender,
            None => bail!("Email has no sender address"),
        };
        let destinations = header_addresses(&mail, "To")?;
        let subject = mail.headers.get_first_value("Subject").unwrap_or_default();

        info!(
            sender = %sender,
            destinations_count = destinations.len(),
            "rejection_context_extracted"
        );

        Ok(Self {
            sender,
            destinations,
            subject,
            site_name: site_name.to_string(),
        })
    }

    /// Merge this context into classifier-supplied template arguments.
    pub fn template_args(&self, extra: TemplateArgs) -> TemplateArgs {
        let mut args = extra;
        args.insert(ARG_FORMER_TITLE.to_string(), self.subject.clone());
        args.insert(ARG_DESTINATION.to_string(), self.destinations.join(", "));
        args.insert(ARG_SITE_NAME.to_string(), self.site_name.clone());
        args
    }
}

/// Collect the bare addresses of an address header, flattening groups.
fn header_addresses(mail: &ParsedMail, name: &str) -> Result<Vec<String>> {
    let header = match mail.headers.get_first_header(name) {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };

    let list = addrparse_header(header)
        .with_context(|| format!("Failed to parse {} header", name))?;

    let mut addresses = Vec::new();
    for addr in list.iter() {
        match addr {
            MailAddr::Single(info) => addresses.push(info.addr.clone()),
            MailAddr::Group(group) => {
                addresses.extend(group.addrs.iter().map(|info| info.addr.clone()))
            }
        }
    }
    Ok(addresses)
}

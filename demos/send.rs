//! Send a message with an optional attachment.
//!
//! ```sh
//! EMAIL=me@example.com EMAIL_AUTH=secret SMTP_HOST=smtp.office365.com \
//!     cargo run --example send -- you@example.com ./report.csv
//! ```

use std::env;

use anyhow::Context;
use simple_email::{Email, EmailClient};

fn main() -> anyhow::Result<()> {
    // Never hard-code credentials: they are read here, by the caller.
    let login = env::var("EMAIL").context("EMAIL is not set")?;
    let password = env::var("EMAIL_AUTH").context("EMAIL_AUTH is not set")?;
    let host = env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.office365.com".to_string());
    let port = match env::var("SMTP_PORT") {
        Ok(port) => port.parse().context("SMTP_PORT is not a port number")?,
        Err(_) => 587,
    };

    let mut args = env::args().skip(1);
    let to = args.next().context("usage: send <recipient> [attachment]")?;

    let client = EmailClient::new(login, password, host, port);
    let mut msg = Email::builder()
        .from(client.login())
        .to(to)
        .subject("Sample Subject Line")
        .body("Here's the body of the e-mail.")
        .build()?;

    if let Some(path) = args.next() {
        msg.add_attachment_from_path(&path)
            .with_context(|| format!("attaching {}", path))?;
    }

    let refused = client.send(&msg)?;
    if refused.is_empty() {
        println!("sent");
    }
    for (recipient, refusal) in refused {
        println!("{} refused: {} {}", recipient, refusal.code, refusal.message);
    }
    Ok(())
}

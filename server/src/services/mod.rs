//! Service collaborators
//!
//! - [`mailer`] - transactional email gateway (SMTP / noop)
//! - [`best_effort`] - side-effect execution policy

pub mod best_effort;
pub mod mailer;

pub use best_effort::best_effort;
pub use mailer::{MailError, Mailer, NoopMailer, SmtpConfig, SmtpMailer};

//! Outgoing email messages and their composers.

use crate::config::MailConfig;
use crate::db::User;

/// An outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Recipient address.
    pub to: String,
    /// Full subject line, prefix included.
    pub subject: String,
    /// Plain-text body.
    pub text_body: String,
    /// HTML body.
    pub html_body: String,
}

/// A display name and address, as in `Flasky Admin <flasky@example.com>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name, if any.
    pub name: Option<String>,
    /// Bare address.
    pub email: String,
}

impl Mailbox {
    /// Parse `Name <addr>` or a bare address.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let (Some(open), true) = (s.rfind('<'), s.ends_with('>')) {
            let name = s[..open].trim().trim_matches('"').trim();
            return Self {
                name: (!name.is_empty()).then(|| name.to_string()),
                email: s[open + 1..s.len() - 1].trim().to_string(),
            };
        }
        Self {
            name: None,
            email: s.to_string(),
        }
    }
}

/// Builds the application's emails from the mail settings.
#[derive(Debug, Clone)]
pub struct Composer {
    subject_prefix: String,
    base_url: String,
}

impl Composer {
    /// Create a composer.
    pub fn new(config: &MailConfig) -> Self {
        Self {
            subject_prefix: config.subject_prefix.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build(&self, to: &str, subject: &str, text_body: String, html_body: String) -> Email {
        let subject = if self.subject_prefix.is_empty() {
            subject.to_string()
        } else {
            format!("{} {}", self.subject_prefix, subject)
        };
        Email {
            to: to.to_string(),
            subject,
            text_body,
            html_body,
        }
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!("{}{}/{}", self.base_url, path, token)
    }

    /// Account confirmation mail with the confirm link.
    pub fn confirm_account(&self, user: &User, token: &str) -> Email {
        let url = self.link("/api/auth/confirm", token);
        let text = format!(
            "Dear {name},\n\n\
             Welcome to Flasky!\n\n\
             To confirm your account please click on the following link:\n\n\
             {url}\n\n\
             Sincerely,\n\n\
             The Flasky Team\n\n\
             Note: replies to this email address are not monitored.\n",
            name = user.username,
        );
        let html = format!(
            "<p>Dear {name},</p>\
             <p>Welcome to <b>Flasky</b>!</p>\
             <p>To confirm your account please <a href=\"{url}\">click here</a>.</p>\
             <p>Alternatively, you can paste the following link in your browser's address bar:</p>\
             <p>{url}</p>\
             <p>Sincerely,</p><p>The Flasky Team</p>\
             <p><small>Note: replies to this email address are not monitored.</small></p>",
            name = escape_html(&user.username),
        );
        self.build(&user.email, "Confirm Your Account", text, html)
    }

    /// Password reset mail with the reset link.
    pub fn reset_password(&self, user: &User, token: &str) -> Email {
        let url = self.link("/api/auth/reset", token);
        let text = format!(
            "Dear {name},\n\n\
             To reset your password click on the following link:\n\n\
             {url}\n\n\
             If you have not requested a password reset simply ignore this message.\n\n\
             Sincerely,\n\n\
             The Flasky Team\n\n\
             Note: replies to this email address are not monitored.\n",
            name = user.username,
        );
        let html = format!(
            "<p>Dear {name},</p>\
             <p>To reset your password <a href=\"{url}\">click here</a>.</p>\
             <p>Alternatively, you can paste the following link in your browser's address bar:</p>\
             <p>{url}</p>\
             <p>If you have not requested a password reset simply ignore this message.</p>\
             <p>Sincerely,</p><p>The Flasky Team</p>\
             <p><small>Note: replies to this email address are not monitored.</small></p>",
            name = escape_html(&user.username),
        );
        self.build(&user.email, "Reset Your Password", text, html)
    }

    /// Email change mail, sent to the new address.
    pub fn change_email(&self, user: &User, new_email: &str, token: &str) -> Email {
        let url = self.link("/api/auth/change-email", token);
        let text = format!(
            "Dear {name},\n\n\
             To confirm your new email address click on the following link:\n\n\
             {url}\n\n\
             Sincerely,\n\n\
             The Flasky Team\n\n\
             Note: replies to this email address are not monitored.\n",
            name = user.username,
        );
        let html = format!(
            "<p>Dear {name},</p>\
             <p>To confirm your new email address <a href=\"{url}\">click here</a>.</p>\
             <p>Alternatively, you can paste the following link in your browser's address bar:</p>\
             <p>{url}</p>\
             <p>Sincerely,</p><p>The Flasky Team</p>\
             <p><small>Note: replies to this email address are not monitored.</small></p>",
            name = escape_html(&user.username),
        );
        self.build(new_email, "Confirm your email address", text, html)
    }

    /// Notification to the administrator about a new registration.
    pub fn new_user(&self, admin: &str, user: &User) -> Email {
        let text = format!("User {} has joined.\n", user.username);
        let html = format!("<p>User <b>{}</b> has joined.</p>", escape_html(&user.username));
        self.build(admin, "New User", text, html)
    }
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

//! Who may change the library.
//!
//! Sign-in itself happens at the identity provider; this side only keeps the
//! resulting profile and checks its email against an allow-list before any
//! mutating call.

use crate::error::{LibraryError, Result};
use crate::models::UserProfile;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    authorized_emails: Vec<String>,
}

impl AccessPolicy {
    /// An empty list lets any signed-in user edit.
    pub fn new(authorized_emails: &[String]) -> Self {
        AccessPolicy {
            authorized_emails: authorized_emails
                .iter()
                .map(|email| email.trim().to_ascii_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    /// True when no allow-list is configured.
    pub fn is_open(&self) -> bool {
        self.authorized_emails.is_empty()
    }

    pub fn is_email_authorized(&self, email: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() {
            return false;
        }
        self.authorized_emails.is_empty() || self.authorized_emails.contains(&email)
    }

    pub fn check<'a>(&self, viewer: Option<&'a UserProfile>) -> Result<&'a UserProfile> {
        let profile = viewer.ok_or(LibraryError::NotSignedIn)?;
        if !self.is_email_authorized(&profile.email) {
            log::warn!("refusing change for unauthorized email {}", profile.email);
            return Err(LibraryError::NotAuthorized {
                email: profile.email.clone(),
            });
        }
        Ok(profile)
    }
}

/// Profile name, or the email's local part when the provider sent none.
pub fn display_name(profile: &UserProfile) -> String {
    let name = profile.name.trim();
    if !name.is_empty() {
        return name.to_string();
    }
    profile
        .email
        .split('@')
        .next()
        .map(str::trim)
        .filter(|local| !local.is_empty())
        .unwrap_or("User")
        .to_string()
}

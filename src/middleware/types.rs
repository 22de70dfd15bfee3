use serde::Deserialize;

use crate::error::Error;
use crate::session::Credentials;
use crate::types::NewAccount;

/// Minimum password length accepted by the sign-up form.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Credentials sign-in form.
#[derive(Deserialize)]
pub(super) struct SignInForm {
    pub(super) email: String,
    pub(super) password: String,
    #[serde(default, rename = "callbackUrl")]
    pub(super) callback_url: Option<String>,
}

impl SignInForm {
    pub(super) fn credentials(&self) -> Credentials {
        Credentials::Password {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

/// Sign-up form. Registration is followed by an automatic sign-in.
#[derive(Deserialize)]
pub(super) struct SignUpForm {
    pub(super) full_name: String,
    pub(super) email: String,
    pub(super) password: String,
    pub(super) confirm_password: String,
}

impl SignUpForm {
    /// Local checks before anything is sent to the API.
    pub(super) fn validate(&self) -> Result<NewAccount, Error> {
        if self.password != self.confirm_password {
            return Err(Error::Validation("Passwords do not match".into()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(Error::Validation("Email is required".into()));
        }
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(Error::Validation("Full name is required".into()));
        }
        Ok(NewAccount {
            email: email.to_string(),
            password: self.password.clone(),
            full_name: full_name.to_string(),
        })
    }
}

#[derive(Deserialize)]
pub(super) struct CallbackParams {
    pub(super) code: Option<String>,
    pub(super) state: Option<String>,
    pub(super) error: Option<String>,
}

/// Keeps post-login redirects on this site and out of header injection.
pub(super) fn local_redirect(target: Option<&str>) -> Option<&str> {
    target.filter(|t| {
        t.starts_with('/')
            && !t.starts_with("//")
            && !t.contains('\\')
            && !t.chars().any(char::is_control)
    })
}

//! Login and registration input.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, InvalidInputError};

/// Username and password for the token endpoint.
#[derive(Clone, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reject blank fields before anything is sent.
    pub fn validate(&self) -> Result<(), Error> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(InvalidInputError::Missing {
                fields: "Username and password".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A new account request.
#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Check required fields and that both passwords agree.
    ///
    /// Email is optional; the server validates its format.
    pub fn validate(&self) -> Result<(), Error> {
        if self.username.trim().is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(InvalidInputError::Missing {
                fields: "Username, password and password confirmation".to_string(),
            }
            .into());
        }

        if self.password != self.confirm_password {
            return Err(InvalidInputError::Mismatch {
                message: "Passwords do not match".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

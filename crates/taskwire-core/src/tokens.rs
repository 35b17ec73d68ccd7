//! Bearer token types.
//!
//! Both tokens are opaque strings. Their `Debug` output is redacted so a
//! stray `{:?}` on a `Credentials` or a request never leaks a secret.

use std::fmt;

macro_rules! secret_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            /// The raw value, for an `Authorization` header, the push-channel
            /// URL, or a refresh/blacklist body. Not for logs.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&"[REDACTED]").finish()
            }
        }
    };
}

secret_token! {
    /// Short-lived token sent as `Bearer` on API requests and as the
    /// `token` query parameter of the push channel.
    AccessToken
}

secret_token! {
    /// Long-lived token traded for a new access token, and blacklisted
    /// on logout.
    RefreshToken
}

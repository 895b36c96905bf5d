use std::borrow::Cow;

/// A specialized [`KeyStoreError`] enum of this crate.
///
/// [`KeyStoreError::KeyNotFound`] deliberately covers every reason a key id cannot be
/// resolved (malformed, missing, expired, future-dated, corrupted), so callers that
/// decrypt untrusted input cannot tell those cases apart.
#[keyrot_derive::keyrot_error]
pub enum KeyStoreError {
    #[error("Key not found{}: {message}", format_context(.context))]
    KeyNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Key store I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid key store configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Random source failure{}: {message}", format_context(.context))]
    Entropy { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl KeyStoreError {
    /// Returns `true` for the merged "no usable key under this id" signal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }

    pub(crate) fn not_found(id: impl std::fmt::Display) -> Self {
        Self::KeyNotFound { message: id.to_string().into(), context: None }
    }
}

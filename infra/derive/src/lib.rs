#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the key store and envelope crates.
//!
//! Only one macro lives here: [`macro@keyrot_error`], which turns a plain enum into
//! the error type every crate of the workspace reports failures with.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for defining crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context()`
///   to `Result<T, Name>` and to `Result<T, Source>` for every wrapped source error.
/// * **Context Accessor**: Generates `Name::context(&self) -> Option<&str>`.
/// * **Standard Conversions**: Implements `From<Source>` for variants holding a `source`
///   field (or a field marked `#[source]`/`#[from]`), so `?` works on upstream errors.
/// * **Formatting Helper**: Emits a module-private `format_context` used by the
///   `#[error(...)]` strings. One annotated enum per module.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. A `context` field must have type `Option<Cow<'static, str>>`.
/// 3. Variants with a source must also carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use keyrot_derive::keyrot_error;
/// use std::borrow::Cow;
///
/// #[keyrot_error]
/// pub enum KeyStoreError {
///     #[error("Key store I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Key not found{}: {message}", format_context(.context))]
///     KeyNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read_key(path: &std::path::Path) -> Result<Vec<u8>, KeyStoreError> {
///     std::fs::read(path).context("Reading key file")
/// }
/// ```
#[proc_macro_attribute]
pub fn keyrot_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

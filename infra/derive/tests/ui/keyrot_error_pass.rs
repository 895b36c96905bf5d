use keyrot_derive::keyrot_error;
use std::borrow::Cow;

#[keyrot_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read(path: &str) -> Result<Vec<u8>, DemoError> {
    std::fs::read(path).context("Reading demo file")
}

fn lookup() -> Result<(), DemoError> {
    Err(DemoError::NotFound { message: "demo".into(), context: None }).context("Lookup")
}

fn main() {
    let err = lookup().unwrap_err();
    assert_eq!(err.context(), Some("Lookup"));
    assert_eq!(err.to_string(), "Not found (Lookup): demo");

    let io: DemoError = std::io::Error::other("boom").into();
    assert_eq!(io.context(), None);

    let _ = read("/definitely/not/here");
}

use crate::dispatcher::Fault;
use std::borrow::Cow;

/// What a handler produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Textual content, written as UTF-8
    Text(String),
    /// Raw bytes, written unchanged
    Binary(Vec<u8>),
    /// Nothing to write; the handler dealt with the response itself
    Empty,
}

impl Reply {
    /// Body bytes for the reply, `None` for [`Reply::Empty`].
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Reply::Text(text) => Some(text.into_bytes()),
            Reply::Binary(bytes) => Some(bytes),
            Reply::Empty => None,
        }
    }
}

/// Conversion of a handler's return value into a [`Reply`].
pub trait IntoReply {
    /// Perform the conversion. An `Err` is treated as a handler fault.
    fn into_reply(self) -> Result<Reply, Fault>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, Fault> {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, Fault> {
        Ok(Reply::Empty)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, Fault> {
        Ok(Reply::Text(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, Fault> {
        Ok(Reply::Text(self.to_string()))
    }
}

impl IntoReply for Cow<'static, str> {
    fn into_reply(self) -> Result<Reply, Fault> {
        Ok(Reply::Text(self.into_owned()))
    }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Result<Reply, Fault> {
        Ok(Reply::Binary(self))
    }
}

impl IntoReply for &'static [u8] {
    fn into_reply(self) -> Result<Reply, Fault> {
        Ok(Reply::Binary(self.to_vec()))
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply, Fault> {
        match self {
            Some(inner) => inner.into_reply(),
            None => Ok(Reply::Empty),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<anyhow::Error>,
{
    fn into_reply(self) -> Result<Reply, Fault> {
        match self {
            Ok(inner) => inner.into_reply(),
            Err(err) => Err(Fault::Handler(err.into())),
        }
    }
}

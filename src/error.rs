// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-publisher.
//
// gelf-publisher is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-publisher is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-publisher.  If
// not, see <http://www.gnu.org/licenses/>.

//! [gelf-publisher](crate) errors

use backtrace::Backtrace;

/// [gelf-publisher](crate) error type
///
/// [gelf-publisher](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of
/// a straightforward enumeration with a few match arms chosen on the basis what the caller will
/// need to repond. Decorators such as [`RetryTransportWrapper`] decide what to do with an error
/// by inspecting its variant through the `is_*` predicates below.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
/// [`RetryTransportWrapper`]: crate::transport::retry::RetryTransportWrapper
#[non_exhaustive]
pub enum Error {
    /// A syslog level outside 0-7, or an unknown level name
    Level { value: String, back: Backtrace },
    /// A [`Message`](crate::message::Message) broke the rules of a GELF standard
    Validation { reason: String, back: Backtrace },
    /// The library was put together in a way that can't work (no transports, a TCP transport
    /// with an encoder that may emit NUL bytes, a bad chunk size &c)
    Configuration { reason: String, back: Backtrace },
    /// A UDP payload would need more chunks than GELF permits
    MessageTooLarge { chunks: usize, back: Backtrace },
    /// An encoder failed to produce its output
    Encode {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// The HTTP collector hung up before sending a single byte of response
    EmptyResponse { back: Backtrace },
    /// The HTTP collector answered with something other than `202 Accepted`
    UnexpectedResponse { status: String, back: Backtrace },
}

impl Error {
    pub(crate) fn level(value: impl ToString) -> Error {
        Error::Level {
            value: value.to_string(),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn validation(reason: impl Into<String>) -> Error {
        Error::Validation {
            reason: reason.into(),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn configuration(reason: impl Into<String>) -> Error {
        Error::Configuration {
            reason: reason.into(),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn too_large(chunks: usize) -> Error {
        Error::MessageTooLarge {
            chunks,
            back: Backtrace::new(),
        }
    }
    /// Wrap `err` as a transport failure; for use by [`AmqpExchange`] implementations & other
    /// code outside this crate that moves messages on [gelf-publisher](crate)'s behalf.
    ///
    /// [`AmqpExchange`]: crate::transport::amqp::AmqpExchange
    pub fn transport<E>(err: E) -> Error
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Error::Transport {
            source: err.into(),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn encode<E>(err: E) -> Error
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Error::Encode {
            source: err.into(),
            back: Backtrace::new(),
        }
    }
    /// True for [`Error::Validation`]
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }
    /// True for [`Error::Configuration`]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
    /// True for [`Error::MessageTooLarge`]
    pub fn is_too_large(&self) -> bool {
        matches!(self, Error::MessageTooLarge { .. })
    }
    /// True for any failure to move bytes to (or a reply from) the collector
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::EmptyResponse { .. } | Error::UnexpectedResponse { .. }
        )
    }
    /// True if an HTTP collector closed the connection without answering; the usual symptom of a
    /// keep-alive socket that went stale between two sends.
    pub fn is_empty_response(&self) -> bool {
        matches!(self, Error::EmptyResponse { .. })
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Level { value, .. } => write!(f, "{:?} is not a valid syslog level", value),
            Error::Validation { reason, .. } => write!(f, "Invalid GELF message: {}", reason),
            Error::Configuration { reason, .. } => write!(f, "Bad configuration: {}", reason),
            Error::MessageTooLarge { chunks, .. } => write!(
                f,
                "Message would need {} UDP chunks; at most {} are allowed",
                chunks,
                crate::transport::udp::MAX_CHUNK_COUNT
            ),
            Error::Encode { source, .. } => write!(f, "While encoding a GELF message, got {}", source),
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            Error::EmptyResponse { .. } => write!(
                f,
                "Graylog server didn't answer properly, expected 'HTTP/1.x 202 Accepted', response is ''"
            ),
            Error::UnexpectedResponse { status, .. } => write!(
                f,
                "Graylog server didn't answer properly, expected 'HTTP/1.x 202 Accepted', response is '{}'",
                status
            ),
            _ => write!(f, "Other gelf-publisher error"),
        }
    }
}

impl std::fmt::Debug for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Level { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Validation { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Configuration { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::MessageTooLarge { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Encode { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Transport { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::EmptyResponse { back } => write!(f, "{}\n{:?}", self, back),
            Error::UnexpectedResponse { back, .. } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "gelf-publisher error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Encode { source, .. } | Error::Transport { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::transport(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let err = Error::EmptyResponse {
            back: Backtrace::new(),
        };
        assert!(err.is_empty_response());
        assert!(err.is_transport());
        assert!(!err.is_validation());

        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(err.is_transport());
        assert!(!err.is_empty_response());
        assert!(std::error::Error::source(&err).is_some());

        assert!(Error::validation("nope").is_validation());
        assert!(Error::configuration("nope").is_configuration());
    }

    #[test]
    fn display() {
        assert_eq!(
            format!("{}", Error::level(9)),
            "\"9\" is not a valid syslog level"
        );
        assert_eq!(
            format!("{}", Error::validation("host not set")),
            "Invalid GELF message: host not set"
        );
    }
}

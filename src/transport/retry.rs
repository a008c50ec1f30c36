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

//! A [`Transport`] decorator that retries failed sends.

use crate::{
    error::{Error, Result},
    standard::FieldMap,
    transport::{http::HttpTransport, Transport},
};

use tracing::debug;

/// Re-send on failure, so long as the error satisfies a predicate & the retry budget lasts.
///
/// A `max_retries` of zero means there is no budget: retry until the predicate says otherwise.
/// The first error the predicate rejects, or the error from the last permitted attempt, is
/// returned unchanged.
pub struct RetryTransportWrapper<T> {
    transport: T,
    max_retries: usize,
    predicate: Box<dyn Fn(&Error) -> bool + Send + Sync>,
}

impl<T: Transport> RetryTransportWrapper<T> {
    pub fn new<P>(transport: T, max_retries: usize, predicate: P) -> RetryTransportWrapper<T>
    where
        P: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        RetryTransportWrapper {
            transport,
            max_retries,
            predicate: Box::new(predicate),
        }
    }
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl RetryTransportWrapper<HttpTransport> {
    /// Retry once when the collector hangs up without answering, the usual symptom of a
    /// keep-alive connection that went stale between sends.
    pub fn http(transport: HttpTransport) -> RetryTransportWrapper<HttpTransport> {
        RetryTransportWrapper::new(transport, 1, Error::is_empty_response)
    }
}

impl<T: Transport> Transport for RetryTransportWrapper<T> {
    fn send(&self, fields: &FieldMap) -> Result<usize> {
        let mut retries = 0;
        loop {
            match self.transport.send(fields) {
                Ok(n) => return Ok(n),
                Err(err)
                    if (self.max_retries == 0 || retries < self.max_retries)
                        && (self.predicate)(&err) =>
                {
                    retries += 1;
                    debug!("Retry #{} after: {}", retries, err);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{empty_response, ScriptedTransport};

    use std::sync::Arc;

    #[test]
    fn retries_matching_error() {
        let inner = Arc::new(ScriptedTransport::new(vec![Err(empty_response()), Ok(7)]));
        let transpo = RetryTransportWrapper::new(inner.clone(), 1, Error::is_empty_response);
        assert_eq!(transpo.send(&FieldMap::new()).unwrap(), 7);
        assert_eq!(inner.calls(), 2);
    }

    #[test]
    fn other_errors_propagate() {
        let inner = Arc::new(ScriptedTransport::new(vec![
            Err(Error::transport("connection refused")),
            Ok(7),
        ]));
        let transpo = RetryTransportWrapper::new(inner.clone(), 1, Error::is_empty_response);
        let err = transpo.send(&FieldMap::new()).unwrap_err();
        assert!(err.is_transport());
        assert!(!err.is_empty_response());
        assert_eq!(inner.calls(), 1);
    }

    #[test]
    fn budget_exhausted() {
        let inner = Arc::new(ScriptedTransport::new(vec![
            Err(empty_response()),
            Err(empty_response()),
            Err(empty_response()),
            Ok(7),
        ]));
        let transpo = RetryTransportWrapper::new(inner.clone(), 2, Error::is_empty_response);
        assert!(transpo.send(&FieldMap::new()).unwrap_err().is_empty_response());
        assert_eq!(inner.calls(), 3);
    }

    #[test]
    fn unlimited() {
        let mut script: Vec<Result<usize>> = (0..10).map(|_| Err(empty_response())).collect();
        script.push(Ok(7));
        let inner = Arc::new(ScriptedTransport::new(script));
        let transpo = RetryTransportWrapper::new(inner.clone(), 0, |_: &Error| true);
        assert_eq!(transpo.send(&FieldMap::new()).unwrap(), 7);
        assert_eq!(inner.calls(), 11);
    }
}

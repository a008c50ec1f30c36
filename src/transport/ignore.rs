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

//! A [`Transport`] decorator that swallows errors.

use crate::{
    error::{Error, Result},
    standard::FieldMap,
    transport::Transport,
};

use tracing::debug;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Report every send as a success.
///
/// A failed send returns `Ok(0)`; the error is kept until the next failure replaces it, so
/// callers that care can still look.
pub struct ErrorIgnoringTransportWrapper<T> {
    transport: T,
    last_error: Mutex<Option<Error>>,
}

impl<T: Transport> ErrorIgnoringTransportWrapper<T> {
    pub fn new(transport: T) -> ErrorIgnoringTransportWrapper<T> {
        ErrorIgnoringTransportWrapper {
            transport,
            last_error: Mutex::new(None),
        }
    }
    /// The description of the most recent failure, if any
    pub fn last_error(&self) -> Option<String> {
        self.lock().as_ref().map(|err| err.to_string())
    }
    /// Remove & return the most recent failure
    pub fn take_last_error(&self) -> Option<Error> {
        self.lock().take()
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn lock(&self) -> MutexGuard<'_, Option<Error>> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> Transport for ErrorIgnoringTransportWrapper<T> {
    fn send(&self, fields: &FieldMap) -> Result<usize> {
        match self.transport.send(fields) {
            Ok(n) => Ok(n),
            Err(err) => {
                debug!("Ignoring transport error: {}", err);
                *self.lock() = Some(err);
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{empty_response, ScriptedTransport};

    #[test]
    fn swallows() {
        let transpo = ErrorIgnoringTransportWrapper::new(ScriptedTransport::new(vec![
            Ok(5),
            Err(Error::transport("connection refused")),
            Err(empty_response()),
            Ok(5),
        ]));
        assert!(transpo.last_error().is_none());

        assert_eq!(transpo.send(&FieldMap::new()).unwrap(), 5);
        assert!(transpo.last_error().is_none());

        assert_eq!(transpo.send(&FieldMap::new()).unwrap(), 0);
        assert_eq!(
            transpo.last_error().unwrap(),
            "Transport error: connection refused"
        );

        // Overwritten by the next failure...
        assert_eq!(transpo.send(&FieldMap::new()).unwrap(), 0);
        assert!(transpo.last_error().unwrap().contains("didn't answer properly"));

        // but not cleared by a success
        assert_eq!(transpo.send(&FieldMap::new()).unwrap(), 5);
        assert!(transpo.take_last_error().unwrap().is_empty_response());
        assert!(transpo.last_error().is_none());
        assert_eq!(transpo.transport().calls(), 4);
    }
}

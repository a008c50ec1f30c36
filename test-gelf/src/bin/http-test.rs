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

//! Test POSTing GELF to http://localhost:12202/gelf.

use gelf_publisher::{
    level::Level, message::Message, publisher::Publisher, transport::http::HttpTransport,
};

use std::sync::Arc;

pub fn main() {
    // Show the library's own diagnostics...
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();
    // and publish to the local collector.
    let publisher = Publisher::new().with_transport(Arc::new(HttpTransport::local().unwrap()));

    for level in [
        Level::LOG_DEBUG,
        Level::LOG_INFO,
        Level::LOG_WARNING,
        Level::LOG_ERR,
        Level::LOG_CRIT,
    ] {
        let mut msg = Message::new();
        msg.set_short_message("你好, HTTP request.")
            .set_level(level)
            .set_additional("test", "http-test")
            .unwrap();
        for outcome in publisher.publish(msg).unwrap() {
            outcome.unwrap();
        }
    }
}

//! # server
//!
//! why: drive an election host from a newline-delimited json stream
//! relations: used by the electiond binary over stdin/stdout, calls host.rs for every line
//! what: serve loop, event lines, bad-request handling

use crate::{ElectionHost, Envelope, ObserverId, Response};
use election_core::ElectionEvent;
use election_storage::Storage;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Serialize)]
struct EventLine<'a> {
    event: &'a ElectionEvent,
}

/// Unsubscribes the serve loop's observer on every exit path
struct Subscription<'a, S: Storage> {
    host: &'a ElectionHost<S>,
    id: ObserverId,
}

impl<S: Storage> Drop for Subscription<'_, S> {
    fn drop(&mut self) {
        self.host.unsubscribe(self.id);
    }
}

/// Read one [`Envelope`] per input line and write its [`Response`] as one line.
///
/// Events emitted by a request are written as `{"event": ...}` lines before its
/// response. Blank lines are skipped; malformed lines get a `bad_request` failure.
/// Returns the number of requests handled once input is exhausted.
pub fn serve<S, R, W>(host: &ElectionHost<S>, input: R, mut output: W) -> io::Result<usize>
where
    S: Storage,
    R: BufRead,
    W: Write,
{
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let id = host.subscribe(move |event: &ElectionEvent| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(event.clone());
        }
    });
    let _subscription = Subscription { host, id };

    let mut handled = 0;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Envelope>(&line) {
            Ok(envelope) => {
                debug!(caller = %envelope.caller, request = ?envelope.request, "request");
                host.handle(&envelope.caller, envelope.request)
            }
            Err(e) => {
                warn!(error = %e, "malformed request line");
                Response::failure("bad_request", e.to_string())
            }
        };

        for event in rx.try_iter() {
            write_line(&mut output, &EventLine { event: &event })?;
        }
        write_line(&mut output, &response)?;
        handled += 1;
    }

    output.flush()?;
    Ok(handled)
}

fn write_line<W: Write, T: Serialize>(output: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *output, value)?;
    output.write_all(b"\n")
}

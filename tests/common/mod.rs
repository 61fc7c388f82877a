//! Shared fixtures for integration tests.

#![allow(dead_code)]

use content_listeners::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One callback as seen by a recording listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connected {
        observer: String,
        reason: ConnectionReason,
        resources: Vec<u64>,
    },
    Disconnected {
        observer: String,
        reason: ConnectionReason,
        resources: Vec<u64>,
    },
}

pub fn connected(observer: &str, reason: ConnectionReason, resources: &[u64]) -> Call {
    Call::Connected {
        observer: observer.to_string(),
        reason,
        resources: resources.to_vec(),
    }
}

pub fn disconnected(observer: &str, reason: ConnectionReason, resources: &[u64]) -> Call {
    Call::Disconnected {
        observer: observer.to_string(),
        reason,
        resources: resources.to_vec(),
    }
}

pub type Log = Arc<Mutex<Vec<Call>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    ErrOnConnect,
    ErrOnDisconnect,
    PanicOnConnect,
}

pub struct Recorder {
    name: String,
    log: Log,
    failure: Failure,
}

fn ids(resources: &[Resource]) -> Vec<u64> {
    resources.iter().map(|resource| resource.id.0).collect()
}

impl ConnectionListener for Recorder {
    fn connected(
        &self,
        _context: &ViewContext,
        reason: ConnectionReason,
        resources: &[Resource],
    ) -> Result<(), ListenerError> {
        self.log.lock().push(connected(&self.name, reason, &ids(resources)));
        match self.failure {
            Failure::ErrOnConnect => Err(format!("{} refused", self.name).into()),
            Failure::PanicOnConnect => panic!("{} exploded", self.name),
            Failure::None | Failure::ErrOnDisconnect => Ok(()),
        }
    }

    fn disconnected(
        &self,
        _context: &ViewContext,
        reason: ConnectionReason,
        resources: &[Resource],
    ) -> Result<(), ListenerError> {
        self.log
            .lock()
            .push(disconnected(&self.name, reason, &ids(resources)));
        match self.failure {
            Failure::ErrOnDisconnect => Err(format!("{} could not let go", self.name).into()),
            _ => Ok(()),
        }
    }
}

pub fn recorder(name: &str, log: &Log, failure: Failure) -> Recorder {
    Recorder {
        name: name.to_string(),
        log: Arc::clone(log),
        failure,
    }
}

/// An observer recording into `log`, plus a counter of handler instantiations.
pub fn observer(
    name: &str,
    patterns: &[&str],
    log: &Log,
    failure: Failure,
) -> (ObserverDescriptor, Arc<AtomicUsize>) {
    let activations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&activations);
    let log = Arc::clone(log);
    let recorder_name = name.to_string();

    let descriptor = ObserverDescriptor::new(name, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(recorder(&recorder_name, &log, failure))
    })
    .with_content_types(patterns.iter().copied());

    (descriptor, activations)
}

pub fn editable_view() -> ViewContext {
    ViewContext::new(1, RoleSet::new().with("editable").with("interactive"))
}

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn take(log: &Log) -> Vec<Call> {
    std::mem::take(&mut *log.lock())
}

pub fn activations(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

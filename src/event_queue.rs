//! Event queue adapter between a foreign event connection and calloop
//!
//! A display connection hands out events from its own socket. It does not
//! fit calloop directly: readiness of the descriptor says nothing about how
//! many events are buffered, and events may already sit in the connection's
//! memory without the descriptor being readable at all (they arrive while
//! waiting for a reply). [`EventQueue`] bridges the two with a FIFO and the
//! four classic source hooks:
//!
//! ```text
//!   before_sleep ──► prepare()   flush, adopt buffered events, ready?
//!   fd readable  ──► check()     drain the socket into the FIFO
//!   ready        ──► dispatch()  pop ONE event, run the callback
//!   drop         ──► finalize()  discard whatever is left
//! ```
//!
//! Only one event is dispatched per loop iteration. While the FIFO is not
//! empty, `prepare` keeps the loop from sleeping through a synthetic event on
//! the adapter's own wake token.

use calloop::generic::Generic;
use calloop::{EventSource, Interest, Mode, Poll, PostAction, Readiness, Token, TokenFactory};
use log::{debug, error, warn};
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::rc::Rc;
use std::time::Duration;

/// Consecutive failed drains after which the connection is considered lost
pub const MAX_FAILED_DRAINS: u32 = 8;

/// A connection that delivers events over a pollable descriptor
pub trait EventConnection {
    type Event;
    type Error: fmt::Display;

    /// Descriptor that becomes readable when new data arrives
    fn poll_fd(&self) -> BorrowedFd<'_>;

    /// Send any buffered outgoing requests
    fn flush(&self) -> Result<(), Self::Error>;

    /// Return the next event without blocking, if one is available
    fn poll_for_event(&self) -> Result<Option<Self::Event>, Self::Error>;
}

/// Registration handle for the connection's descriptor
pub struct ConnectionFd<C>(Rc<C>);

impl<C: EventConnection> AsFd for ConnectionFd<C> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.poll_fd()
    }
}

/// Result of [`EventQueue::prepare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prepared {
    /// Events are waiting, the loop must not sleep
    pub ready: bool,
    /// Upper bound on the sleep; `None` blocks until some source is ready
    pub timeout: Option<Duration>,
}

/// FIFO of events read from an [`EventConnection`]
pub struct EventQueue<C: EventConnection> {
    connection: Rc<C>,
    source: Generic<ConnectionFd<C>>,
    queue: VecDeque<C::Event>,
    wake_token: Option<Token>,
    dispatched: bool,
    failed_drains: u32,
}

impl<C: EventConnection> EventQueue<C> {
    pub fn new(connection: Rc<C>) -> Self {
        let source = Generic::new(
            ConnectionFd(connection.clone()),
            Interest::READ,
            Mode::Level,
        );
        Self {
            connection,
            source,
            queue: VecDeque::new(),
            wake_token: None,
            dispatched: false,
            failed_drains: 0,
        }
    }

    /// Number of events waiting for dispatch
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Runs before the loop sleeps
    pub fn prepare(&mut self) -> Prepared {
        if let Err(e) = self.connection.flush() {
            warn!("Failed to flush display connection: {}", e);
        }
        // Replies read in the meantime may have pulled events off the socket
        self.drain();
        Prepared {
            ready: !self.queue.is_empty(),
            timeout: None,
        }
    }

    /// Runs after polling with the descriptor's readiness
    ///
    /// A failed drain still reports ready: a missed wakeup is worse than one
    /// spurious dispatch.
    pub fn check(&mut self, readiness: Readiness) -> bool {
        if readiness.readable && !self.drain() {
            return true;
        }
        !self.queue.is_empty()
    }

    /// Deliver exactly one event, returning whether the source stays registered
    pub fn dispatch<F>(&mut self, callback: F) -> PostAction
    where
        F: FnOnce(C::Event) -> bool,
    {
        let Some(event) = self.queue.pop_front() else {
            return PostAction::Continue;
        };

        if callback(event) {
            PostAction::Continue
        } else {
            debug!("Event callback asked for removal");
            PostAction::Remove
        }
    }

    /// Discard undelivered events
    pub fn finalize(&mut self) {
        if !self.queue.is_empty() {
            debug!("Discarding {} undelivered display events", self.queue.len());
        }
        self.queue.clear();
    }

    /// Move everything the connection has into the FIFO, false on error
    fn drain(&mut self) -> bool {
        loop {
            match self.connection.poll_for_event() {
                Ok(Some(event)) => self.queue.push_back(event),
                Ok(None) => {
                    self.failed_drains = 0;
                    return true;
                }
                Err(e) => {
                    self.failed_drains += 1;
                    error!("Failed to read display events: {}", e);
                    return false;
                }
            }
        }
    }
}

impl<C: EventConnection> Drop for EventQueue<C> {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl<C: EventConnection> EventSource for EventQueue<C> {
    type Event = C::Event;
    type Metadata = ();
    type Ret = bool;
    type Error = io::Error;

    const NEEDS_EXTRA_LIFECYCLE_EVENTS: bool = true;

    fn process_events<F>(
        &mut self,
        readiness: Readiness,
        token: Token,
        mut callback: F,
    ) -> Result<PostAction, Self::Error>
    where
        F: FnMut(Self::Event, &mut Self::Metadata) -> Self::Ret,
    {
        let ready = if Some(token) == self.wake_token {
            !self.queue.is_empty()
        } else {
            let mut fd_readiness = None;
            self.source.process_events(readiness, token, |readiness, _| {
                fd_readiness = Some(readiness);
                Ok(PostAction::Continue)
            })?;
            match fd_readiness {
                Some(readiness) => self.check(readiness),
                None => return Ok(PostAction::Continue),
            }
        };

        if self.queue.is_empty() && self.failed_drains >= MAX_FAILED_DRAINS {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                format!(
                    "display connection failed {} times in a row",
                    self.failed_drains
                ),
            ));
        }

        // The descriptor and the wake token can both fire in one iteration
        if !ready || self.dispatched {
            return Ok(PostAction::Continue);
        }
        self.dispatched = true;
        Ok(self.dispatch(|event| callback(event, &mut ())))
    }

    fn register(&mut self, poll: &mut Poll, token_factory: &mut TokenFactory) -> calloop::Result<()> {
        self.source.register(poll, token_factory)?;
        self.wake_token = Some(token_factory.token());
        Ok(())
    }

    fn reregister(
        &mut self,
        poll: &mut Poll,
        token_factory: &mut TokenFactory,
    ) -> calloop::Result<()> {
        self.source.reregister(poll, token_factory)?;
        self.wake_token = Some(token_factory.token());
        Ok(())
    }

    fn unregister(&mut self, poll: &mut Poll) -> calloop::Result<()> {
        self.source.unregister(poll)?;
        self.wake_token = None;
        Ok(())
    }

    fn before_sleep(&mut self) -> calloop::Result<Option<(Readiness, Token)>> {
        self.dispatched = false;
        let prepared = self.prepare();
        match self.wake_token {
            Some(token) if prepared.ready => Ok(Some((
                Readiness {
                    readable: true,
                    writable: false,
                    error: false,
                },
                token,
            ))),
            _ => Ok(None),
        }
    }
}

//! Resource lifecycle tests for the inhibitor lock
//!
//! The lock handle is a real file descriptor here, as it is with logind:
//! releasing the lock must close it, which the other end of a socket pair
//! observes as end-of-file.

use std::io::Read;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use monitord::inhibitor::{InhibitorError, LockState};
use monitord::{InhibitorBackend, InhibitorManager};

#[derive(Default)]
struct SocketBackend {
    requests: usize,
}

impl InhibitorBackend for SocketBackend {
    type Handle = OwnedFd;

    fn request(&mut self) -> Result<(), InhibitorError> {
        self.requests += 1;
        Ok(())
    }
}

/// A lock handle plus the peer that sees it close
fn lock_pair() -> (OwnedFd, UnixStream) {
    let (lock, peer) = UnixStream::pair().unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
    (OwnedFd::from(lock), peer)
}

fn is_closed(peer: &mut UnixStream) -> bool {
    let mut buf = [0u8; 1];
    matches!(peer.read(&mut buf), Ok(0))
}

#[test]
fn test_release_closes_handle() {
    let mut inhibitor = InhibitorManager::new(SocketBackend::default());
    let (lock, mut peer) = lock_pair();

    inhibitor.acquire();
    assert!(inhibitor.resolve::<String>(Ok(lock)));
    assert!(matches!(inhibitor.state(), LockState::Held(_)));

    inhibitor.release();
    assert!(is_closed(&mut peer));
}

#[test]
fn test_unwanted_handle_is_closed_on_arrival() {
    let mut inhibitor = InhibitorManager::new(SocketBackend::default());
    let (lock, mut peer) = lock_pair();

    inhibitor.acquire();
    inhibitor.release();
    assert!(!inhibitor.resolve::<String>(Ok(lock)));
    assert!(is_closed(&mut peer));
    assert!(matches!(inhibitor.state(), LockState::Free));
}

#[test]
fn test_dropping_manager_closes_handle() {
    let (lock, mut peer) = lock_pair();
    {
        let mut inhibitor = InhibitorManager::new(SocketBackend::default());
        inhibitor.acquire();
        inhibitor.resolve::<String>(Ok(lock));
        assert!(inhibitor.is_held());
    }
    assert!(is_closed(&mut peer));
}

#[test]
fn test_cycles_reuse_nothing() {
    let mut inhibitor = InhibitorManager::new(SocketBackend::default());

    for round in 1..=5 {
        let (lock, mut peer) = lock_pair();
        inhibitor.acquire();
        assert!(inhibitor.resolve::<String>(Ok(lock)));
        inhibitor.release();
        assert!(is_closed(&mut peer), "round {}", round);
        assert_eq!(inhibitor.backend().requests, round);
    }
}

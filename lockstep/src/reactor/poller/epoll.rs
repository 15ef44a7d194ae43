//! Linux `epoll`-based parker.
//!
//! The runtime thread blocks in `epoll_wait` on a single `eventfd`.
//! Writing to the eventfd interrupts the wait, which is how wakers fired
//! from other threads reach a parked runtime. Timer deadlines are honoured
//! through the `epoll_wait` timeout.

use libc::{
    EFD_CLOEXEC, EFD_NONBLOCK, EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLLIN, epoll_create1, epoll_ctl,
    epoll_event, epoll_wait, eventfd,
};
use std::io;
use std::os::unix::io::RawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Token of the wake-up eventfd inside the epoll set.
const WAKE_TOKEN: u64 = u64::MAX;

/// Wake side of the parker, shared with every task waker.
pub(crate) struct Unparker {
    /// Eventfd polled by the parker.
    fd: RawFd,

    /// Set once a wake-up is pending, so repeated wakes skip the syscall.
    notified: AtomicBool,
}

impl Unparker {
    /// Wakes the parked runtime thread, or makes its next park return
    /// immediately.
    pub(crate) fn unpark(&self) {
        if self.notified.swap(true, Ordering::AcqRel) {
            return;
        }

        let buf: u64 = 1;
        unsafe {
            libc::write(self.fd, &buf as *const _ as *const _, 8);
        }
    }

    /// Drains the eventfd, then re-enables the wake syscall.
    ///
    /// The flag is cleared **after** draining: an unpark racing with the
    /// drain either sees the flag still set (and its task is already in
    /// the ready queue) or writes a fresh event.
    fn reset(&self) {
        let mut buf = 0u64;
        unsafe {
            libc::read(self.fd, &mut buf as *mut _ as *mut _, 8);
        }

        self.notified.store(false, Ordering::Release);
    }
}

impl Drop for Unparker {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

/// Linux parker owning an `epoll` instance.
pub(crate) struct Parker {
    /// Epoll file descriptor.
    epoll: RawFd,

    /// Reusable buffer for epoll events.
    events: Vec<epoll_event>,

    /// Wake side, registered in the epoll set.
    unparker: Arc<Unparker>,
}

impl Parker {
    /// Creates the epoll instance and registers a non-blocking eventfd
    /// as its only, persistent wake source.
    pub(crate) fn new() -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        let fd = unsafe { eventfd(0, EFD_NONBLOCK | EFD_CLOEXEC) };
        if fd < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(epoll) };
            return Err(err);
        }

        let mut event = epoll_event {
            events: EPOLLIN as u32,
            u64: WAKE_TOKEN,
        };

        let rc = unsafe { epoll_ctl(epoll, EPOLL_CTL_ADD, fd, &mut event) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            unsafe {
                libc::close(fd);
                libc::close(epoll);
            }
            return Err(err);
        }

        Ok(Self {
            epoll,
            events: Vec::with_capacity(4),
            unparker: Arc::new(Unparker {
                fd,
                notified: AtomicBool::new(false),
            }),
        })
    }

    pub(crate) fn unparker(&self) -> Arc<Unparker> {
        self.unparker.clone()
    }

    /// Blocks until an unpark happens or `timeout` expires.
    ///
    /// The timeout is rounded up to the next millisecond so the thread
    /// never wakes before a timer deadline.
    pub(crate) fn park(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let timeout_ms = timeout
            .map(|t| t.as_nanos().div_ceil(1_000_000).min(i32::MAX as u128) as i32)
            .unwrap_or(-1);

        let n = unsafe {
            epoll_wait(
                self.epoll,
                self.events.as_mut_ptr(),
                self.events.capacity() as i32,
                timeout_ms,
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        unsafe {
            self.events.set_len(n as usize);
        }

        if self.events.iter().any(|ev| ev.u64 == WAKE_TOKEN) {
            self.unparker.reset();
        }

        self.events.clear();

        Ok(())
    }
}

impl Drop for Parker {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.epoll);
        }
    }
}

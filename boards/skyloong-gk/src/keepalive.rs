//! Background keep-alive pinging.
//!
//! The firmware drops back to its own animation when it stops hearing pings,
//! so a dedicated thread pings on a fixed period for as long as the driver
//! lives. It shares the [`Link`] mutex with color updates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use skyloong_protocol::abi;
use tracing::{debug, warn};

use crate::transport::{Link, Transport};

/// Default ping period
pub const KEEPALIVE_PERIOD: Duration = Duration::from_secs(2);

/// Handle to the running keep-alive thread. Stops and joins on drop.
pub struct KeepAlive {
    stop: Arc<AtomicBool>,
    lost: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeepAlive {
    /// Spawn the thread. The first ping goes out one period from now.
    pub fn spawn<T: Transport>(link: Arc<Link<T>>, period: Duration) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let lost = Arc::new(AtomicBool::new(false));
        let handle = thread::Builder::new()
            .name("skyloong-keepalive".into())
            .spawn({
                let stop = stop.clone();
                let lost = lost.clone();
                move || run(&link, period, &stop, &lost)
            })?;

        Ok(Self {
            stop,
            lost,
            handle: Some(handle),
        })
    }

    /// False once a ping could not be delivered. Stays false.
    pub fn is_healthy(&self) -> bool {
        !self.lost.load(Ordering::Acquire)
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!("keep-alive thread panicked");
            }
        }
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<T: Transport>(link: &Link<T>, period: Duration, stop: &AtomicBool, lost: &AtomicBool) {
    debug!("keep-alive started, period {period:?}");
    while wait(period, stop) {
        if let Err(e) = link.send(&abi::ping()) {
            warn!("keep-alive ping failed: {e}");
            lost.store(true, Ordering::Release);
        }
    }
    debug!("keep-alive stopped");
}

/// Sleep for `period`, returning false as soon as `stop` is raised
fn wait(period: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + period;
    loop {
        if stop.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::park_timeout(deadline - now);
    }
}

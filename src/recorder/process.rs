use std::io;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Signals used by the staged shutdown, gentlest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
    Kill,
}

impl Signal {
    #[cfg(unix)]
    fn raw(self) -> libc::c_int {
        match self {
            Self::Interrupt => libc::SIGINT,
            Self::Terminate => libc::SIGTERM,
            Self::Kill => libc::SIGKILL,
        }
    }
}

/// Liveness checks and signal delivery for a supervised process.
pub trait ProcessControl {
    fn is_alive(&self) -> bool;

    fn send_signal(&self, signal: Signal) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownPolicy {
    /// Delay between liveness checks
    pub poll_interval: Duration,
    /// How long each of the interrupt and terminate stages waits
    pub grace: Duration,
}

impl Default for ShutdownPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            grace: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Nothing was sent, the process had exited before the request
    AlreadyExited,
    /// The process exited within the grace period of this signal
    ExitedAfter(Signal),
    /// Kill was sent; the exit watcher reports the final status
    KillSent,
}

/// Stop a process with interrupt, then terminate, then kill.
///
/// Blocks the calling thread for at most two grace periods. A stage is skipped
/// only when the process is observed to have exited before it.
pub fn staged_shutdown<P: ProcessControl + ?Sized>(
    process: &P,
    policy: &ShutdownPolicy,
) -> ShutdownOutcome {
    if !process.is_alive() {
        return ShutdownOutcome::AlreadyExited;
    }

    for signal in [Signal::Interrupt, Signal::Terminate] {
        deliver(process, signal);

        if wait_for_exit(process, policy) {
            info!("Recorder exited after {:?}", signal);
            return ShutdownOutcome::ExitedAfter(signal);
        }
    }

    if !process.is_alive() {
        return ShutdownOutcome::ExitedAfter(Signal::Terminate);
    }

    warn!("Recorder ignored interrupt and terminate, killing it");
    deliver(process, Signal::Kill);
    ShutdownOutcome::KillSent
}

fn deliver<P: ProcessControl + ?Sized>(process: &P, signal: Signal) {
    if let Err(e) = process.send_signal(signal) {
        warn!("Failed to send {:?} to recorder: {}", signal, e);
    }
}

/// Poll until the process exits or the grace period elapses.
fn wait_for_exit<P: ProcessControl + ?Sized>(process: &P, policy: &ShutdownPolicy) -> bool {
    let deadline = Instant::now() + policy.grace;
    loop {
        if !process.is_alive() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(policy.poll_interval);
    }
}

#[cfg(unix)]
pub(crate) fn signal_pid(pid: u32, signal: Signal) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid, signal.raw()) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub(crate) fn signal_pid(_pid: u32, signal: Signal) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{:?} is only supported on unix", signal),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Scripted process that exits on the configured signal.
    struct FakeProcess {
        alive: Cell<bool>,
        exits_on: Option<Signal>,
        sent: RefCell<Vec<Signal>>,
    }

    impl FakeProcess {
        fn running(exits_on: Option<Signal>) -> Self {
            Self {
                alive: Cell::new(true),
                exits_on,
                sent: RefCell::new(Vec::new()),
            }
        }

        fn exited() -> Self {
            let process = Self::running(None);
            process.alive.set(false);
            process
        }

        fn sent(&self) -> Vec<Signal> {
            self.sent.borrow().clone()
        }
    }

    impl ProcessControl for FakeProcess {
        fn is_alive(&self) -> bool {
            self.alive.get()
        }

        fn send_signal(&self, signal: Signal) -> io::Result<()> {
            self.sent.borrow_mut().push(signal);
            if self.exits_on == Some(signal) || signal == Signal::Kill {
                self.alive.set(false);
            }
            Ok(())
        }
    }

    fn fast_policy() -> ShutdownPolicy {
        ShutdownPolicy {
            poll_interval: Duration::from_millis(1),
            grace: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_already_exited_sends_nothing() {
        let process = FakeProcess::exited();
        let outcome = staged_shutdown(&process, &fast_policy());

        assert_eq!(outcome, ShutdownOutcome::AlreadyExited);
        assert!(process.sent().is_empty());
    }

    #[test]
    fn test_interrupt_is_enough_for_cooperative_process() {
        let process = FakeProcess::running(Some(Signal::Interrupt));
        let outcome = staged_shutdown(&process, &fast_policy());

        assert_eq!(outcome, ShutdownOutcome::ExitedAfter(Signal::Interrupt));
        assert_eq!(process.sent(), vec![Signal::Interrupt]);
    }

    #[test]
    fn test_escalates_to_terminate() {
        let process = FakeProcess::running(Some(Signal::Terminate));
        let outcome = staged_shutdown(&process, &fast_policy());

        assert_eq!(outcome, ShutdownOutcome::ExitedAfter(Signal::Terminate));
        assert_eq!(process.sent(), vec![Signal::Interrupt, Signal::Terminate]);
    }

    #[test]
    fn test_escalates_to_kill_in_order() {
        let process = FakeProcess::running(None);
        let started = Instant::now();
        let outcome = staged_shutdown(&process, &fast_policy());

        assert_eq!(outcome, ShutdownOutcome::KillSent);
        assert_eq!(
            process.sent(),
            vec![Signal::Interrupt, Signal::Terminate, Signal::Kill]
        );
        // Both grace windows were waited out
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_signal_failures_do_not_stop_escalation() {
        struct Deaf {
            sent: RefCell<Vec<Signal>>,
        }

        impl ProcessControl for Deaf {
            fn is_alive(&self) -> bool {
                true
            }

            fn send_signal(&self, signal: Signal) -> io::Result<()> {
                self.sent.borrow_mut().push(signal);
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            }
        }

        let process = Deaf {
            sent: RefCell::new(Vec::new()),
        };
        let outcome = staged_shutdown(&process, &fast_policy());

        assert_eq!(outcome, ShutdownOutcome::KillSent);
        assert_eq!(process.sent.borrow().len(), 3);
    }
}

use std::ffi::OsStr;
use std::io;
use std::os::linux::net::SocketAddrExt;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::net::{SocketAddr, UnixDatagram};

use sps30::sampling::Liveness;
use tracing::{debug, warn};

const NOTIFY_SOCKET: &str = "NOTIFY_SOCKET";

struct NotifyTarget {
    socket: UnixDatagram,
    addr: SocketAddr,
}

/// systemd notification over `$NOTIFY_SOCKET`. Does nothing when the daemon
/// is not run by a service manager.
pub struct SystemdWatchdog {
    target: Option<NotifyTarget>,
}

impl SystemdWatchdog {
    pub fn from_env() -> Self {
        match std::env::var_os(NOTIFY_SOCKET) {
            Some(path) => Self::connect(&path),
            None => {
                debug!("NOTIFY_SOCKET not set, service notifications disabled");
                Self { target: None }
            }
        }
    }

    /// `@` selects the abstract socket namespace.
    pub fn connect(notify_socket: &OsStr) -> Self {
        let target = notify_addr(notify_socket).and_then(|addr| {
            Ok(NotifyTarget {
                socket: UnixDatagram::unbound()?,
                addr,
            })
        });
        match target {
            Ok(target) => Self {
                target: Some(target),
            },
            Err(err) => {
                warn!(error = %err, "invalid NOTIFY_SOCKET, service notifications disabled");
                Self { target: None }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    fn send(&self, state: &[u8]) {
        if let Some(target) = &self.target {
            if let Err(err) = target.socket.send_to_addr(state, &target.addr) {
                warn!(error = %err, "failed to notify service manager");
            }
        }
    }
}

impl Liveness for SystemdWatchdog {
    fn ready(&mut self) {
        self.send(b"READY=1");
    }

    fn notify(&mut self) {
        self.send(b"WATCHDOG=1");
    }
}

fn notify_addr(notify_socket: &OsStr) -> io::Result<SocketAddr> {
    let bytes = notify_socket.as_bytes();
    match bytes.split_first() {
        Some((b'@', name)) => SocketAddr::from_abstract_name(name),
        Some(_) => SocketAddr::from_pathname(notify_socket),
        None => Err(io::Error::new(io::ErrorKind::InvalidInput, "empty socket path")),
    }
}

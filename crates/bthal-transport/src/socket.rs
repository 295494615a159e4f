use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::traits::HalStream;

/// Listening side of the HAL control socket.
///
/// Abstract endpoints leave nothing on the filesystem. Path endpoints are
/// created with mode 0600 and removed on drop, provided the path still
/// refers to the socket this listener created.
pub struct HalSocket {
    listener: UnixListener,
    endpoint: Endpoint,
    created_inode: Option<(u64, u64)>,
}

impl HalSocket {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// Unix `sockaddr_un.sun_path` is 108 bytes on Linux, 104 on macOS and the BSDs.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on `endpoint`.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            Endpoint::Abstract(name) => Self::bind_abstract(name),
            Endpoint::Path(path) => Self::bind_path(path, Self::DEFAULT_SOCKET_MODE),
        }
    }

    #[cfg(target_os = "linux")]
    fn bind_abstract(name: &str) -> Result<Self> {
        use std::os::linux::net::SocketAddrExt;

        let endpoint = Endpoint::Abstract(name.to_string());
        Self::check_abstract_len(name)?;

        let addr = std::os::unix::net::SocketAddr::from_abstract_name(name.as_bytes()).map_err(
            |source| TransportError::Bind {
                endpoint: endpoint.to_string(),
                source,
            },
        )?;
        let listener = UnixListener::bind_addr(&addr).map_err(|source| TransportError::Bind {
            endpoint: endpoint.to_string(),
            source,
        })?;

        info!(%endpoint, "listening on abstract socket");

        Ok(Self {
            listener,
            endpoint,
            created_inode: None,
        })
    }

    #[cfg(not(target_os = "linux"))]
    fn bind_abstract(name: &str) -> Result<Self> {
        Err(TransportError::Unsupported(format!("@{name}")))
    }

    fn bind_path(path: &Path, mode: u32) -> Result<Self> {
        let path = path.to_path_buf();
        let endpoint = Endpoint::Path(path.clone());
        Self::check_path_len(&path)?;

        let bind_err = |source| TransportError::Bind {
            endpoint: endpoint.to_string(),
            source,
        };

        // Stale sockets are replaced; anything else at the path is left alone.
        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(bind_err)?;
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
            .map_err(bind_err)?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "listening on unix domain socket");

        Ok(Self {
            listener,
            endpoint,
            created_inode: Some((created.dev(), created.ino())),
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<HalStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(endpoint = %self.endpoint, "accepted connection");
        Ok(HalStream::from_unix(stream))
    }

    /// Connect to a listening HAL socket (blocking).
    pub fn connect(endpoint: &Endpoint) -> Result<HalStream> {
        let connect_err = |source| TransportError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };

        let stream = match endpoint {
            Endpoint::Abstract(name) => connect_abstract(name).map_err(connect_err)?,
            Endpoint::Path(path) => {
                Self::check_path_len(path)?;
                UnixStream::connect(path).map_err(connect_err)?
            }
        };
        debug!(%endpoint, "connected to hal socket");
        Ok(HalStream::from_unix(stream))
    }

    /// The endpoint this socket is bound to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match self.endpoint {
            Endpoint::Abstract(_) => "abstract-unix-socket",
            Endpoint::Path(_) => "unix-domain-socket",
        }
    }

    fn check_path_len(path: &Path) -> Result<()> {
        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path: PathBuf::from(path),
                len,
                max: Self::MAX_PATH_LEN,
            });
        }
        Ok(())
    }

    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    fn check_abstract_len(name: &str) -> Result<()> {
        // One byte of sun_path holds the leading NUL.
        let max = Self::MAX_PATH_LEN - 1;
        if name.len() > max {
            return Err(TransportError::NameTooLong {
                name: name.to_string(),
                len: name.len(),
                max,
            });
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn connect_abstract(name: &str) -> std::io::Result<UnixStream> {
    use std::os::linux::net::SocketAddrExt;

    let addr = std::os::unix::net::SocketAddr::from_abstract_name(name.as_bytes())?;
    UnixStream::connect_addr(&addr)
}

#[cfg(not(target_os = "linux"))]
fn connect_abstract(_name: &str) -> std::io::Result<UnixStream> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "abstract socket names require Linux",
    ))
}

impl Drop for HalSocket {
    fn drop(&mut self) {
        let (Endpoint::Path(path), Some((expected_dev, expected_ino))) =
            (&self.endpoint, self.created_inode)
        else {
            return;
        };
        if let Ok(metadata) = std::fs::symlink_metadata(path) {
            if metadata.file_type().is_socket()
                && metadata.dev() == expected_dev
                && metadata.ino() == expected_ino
            {
                debug!(?path, "cleaning up socket file");
                let _ = std::fs::remove_file(path);
            } else {
                debug!(?path, "socket path identity changed; skipping cleanup");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bthal-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_bind_accept_connect_path() {
        let dir = temp_dir("path");
        let endpoint = Endpoint::path(dir.join("hal.sock"));

        let listener = HalSocket::bind(&endpoint).unwrap();
        assert_eq!(listener.transport_name(), "unix-domain-socket");

        let client_endpoint = endpoint.clone();
        let handle = std::thread::spawn(move || {
            let mut client = HalSocket::connect(&client_endpoint).unwrap();
            client.write_all(&[0x00, 0x01, 0x01, 0x00, 0x01]).unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x01, 0x01, 0x00, 0x01]);
        handle.join().unwrap();

        drop(listener);
        assert!(
            !dir.join("hal.sock").exists(),
            "socket file should be cleaned up on drop"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_bind_accept_connect_abstract() {
        let endpoint = Endpoint::abstract_name(format!("bthal-test-{}", std::process::id()));
        let listener = HalSocket::bind(&endpoint).unwrap();
        assert_eq!(listener.transport_name(), "abstract-unix-socket");

        let client_endpoint = endpoint.clone();
        let handle = std::thread::spawn(move || {
            let mut client = HalSocket::connect(&client_endpoint).unwrap();
            client.write_all(b"ok").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 2];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ok");
        handle.join().unwrap();
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_abstract_name_too_long() {
        let endpoint = Endpoint::abstract_name("n".repeat(200));
        let result = HalSocket::bind(&endpoint);
        assert!(matches!(result, Err(TransportError::NameTooLong { .. })));
    }

    #[test]
    fn test_connect_missing_endpoint_fails() {
        let endpoint = Endpoint::path("/tmp/bthal-does-not-exist.sock");
        let result = HalSocket::connect(&endpoint);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_path_too_long() {
        let endpoint = Endpoint::path("/tmp/".to_string() + &"a".repeat(200) + ".sock");
        let result = HalSocket::bind(&endpoint);
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }

    #[test]
    fn test_bind_default_permissions_hardened() {
        let dir = temp_dir("perms");
        let sock_path = dir.join("perm.sock");

        let listener = HalSocket::bind(&Endpoint::path(&sock_path)).unwrap();
        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bind_rejects_existing_non_socket_file() {
        let dir = temp_dir("bind-file");
        let sock_path = dir.join("not-a-socket.sock");
        std::fs::write(&sock_path, b"regular-file").unwrap();

        let result = HalSocket::bind(&Endpoint::path(&sock_path));
        assert!(matches!(result, Err(TransportError::Bind { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_drop_does_not_remove_replaced_path() {
        let dir = temp_dir("drop-race");
        let sock_path = dir.join("drop.sock");

        let listener = HalSocket::bind(&Endpoint::path(&sock_path)).unwrap();
        std::fs::remove_file(&sock_path).unwrap();
        std::fs::write(&sock_path, b"replacement-file").unwrap();

        drop(listener);
        assert!(
            sock_path.exists(),
            "drop must not remove path if inode identity changed"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}

use std::{fmt, io, path::PathBuf};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpStream, UnixStream},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::{
    Attrs, Command, MpdError, Remote, Subsystem, WaitOutcome,
    protocol::{Connection, Response},
};

/// Where the MPD daemon listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// TCP host and port
    Tcp {
        /// Host name or IP address
        host: String,
        /// TCP port
        port: u16,
    },
    /// Unix domain socket
    Unix(PathBuf),
    /// Linux abstract socket, named without the leading `@`
    Abstract(String),
}

impl Address {
    /// Local socket address; `@name` selects the abstract namespace
    pub fn local(socket: &str) -> Self {
        match socket.strip_prefix('@') {
            Some(name) => Self::Abstract(name.to_string()),
            None => Self::Unix(PathBuf::from(socket)),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "{host}:{port}"),
            Self::Unix(path) => write!(f, "{}", path.display()),
            Self::Abstract(name) => write!(f, "@{name}"),
        }
    }
}

/// MPD client holding two connections: one for commands, one parked in `idle`.
///
/// MPD refuses every command on a connection that is idling, so change
/// notification needs its own socket.
pub struct MpdClient {
    address: Address,
    commands: Mutex<Connection>,
    watcher: Mutex<Connection>,
}

impl MpdClient {
    /// Connect both sockets and authenticate them
    ///
    /// # Errors
    /// Returns [`MpdError`] if the daemon is unreachable or rejects the password.
    #[instrument(skip(password))]
    pub async fn connect(address: Address, password: Option<&str>) -> Result<Self, MpdError> {
        let commands = open(&address, password).await?;
        let watcher = open(&address, password).await?;
        info!(version = commands.version(), "Connected to MPD at {address}");

        Ok(Self {
            address,
            commands: Mutex::new(commands),
            watcher: Mutex::new(watcher),
        })
    }

    async fn execute(&self, name: &str, args: &[String]) -> Result<Response, MpdError> {
        let mut conn = self.commands.lock().await;
        conn.execute(name, args).await
    }

    /// Fetch a picture in chunks with `readpicture` or `albumart`.
    async fn read_binary(&self, command: &str, path: &str) -> Result<Vec<u8>, MpdError> {
        let mut data = Vec::new();

        loop {
            let args = [path.to_string(), data.len().to_string()];
            let mut response = self.execute(command, &args).await?;
            let size: usize = response
                .value("size")
                .and_then(|size| size.parse().ok())
                .unwrap_or(0);

            match response.take_binary() {
                Some(chunk) if !chunk.is_empty() => data.extend_from_slice(&chunk),
                _ => break,
            }
            if data.len() >= size {
                break;
            }
        }

        Ok(data)
    }
}

async fn open(address: &Address, password: Option<&str>) -> Result<Connection, MpdError> {
    let (reader, writer): (
        Box<dyn AsyncRead + Send + Unpin>,
        Box<dyn AsyncWrite + Send + Unpin>,
    ) = match address {
        Address::Tcp { host, port } => {
            let (r, w) = TcpStream::connect((host.as_str(), *port))
                .await?
                .into_split();
            (Box::new(r), Box::new(w))
        }
        Address::Unix(path) => {
            let (r, w) = UnixStream::connect(path).await?.into_split();
            (Box::new(r), Box::new(w))
        }
        Address::Abstract(name) => {
            let (r, w) = connect_abstract(name).await?.into_split();
            (Box::new(r), Box::new(w))
        }
    };

    let mut conn = Connection::handshake(reader, writer).await?;
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        conn.execute("password", &[password.to_string()]).await?;
    }

    Ok(conn)
}

#[cfg(target_os = "linux")]
async fn connect_abstract(name: &str) -> io::Result<UnixStream> {
    use std::os::{linux::net::SocketAddrExt, unix::net::SocketAddr};

    let addr = SocketAddr::from_abstract_name(name.as_bytes())?;
    let stream = tokio::task::spawn_blocking(move || {
        std::os::unix::net::UnixStream::connect_addr(&addr)
    })
    .await
    .map_err(io::Error::other)??;
    stream.set_nonblocking(true)?;
    UnixStream::from_std(stream)
}

#[cfg(not(target_os = "linux"))]
async fn connect_abstract(name: &str) -> io::Result<UnixStream> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("abstract socket @{name} is only available on Linux"),
    ))
}

#[async_trait]
impl Remote for MpdClient {
    fn address(&self) -> String {
        self.address.to_string()
    }

    async fn status(&self) -> Result<Attrs, MpdError> {
        Ok(self.execute("status", &[]).await?.into_attrs())
    }

    async fn current_song(&self) -> Result<Attrs, MpdError> {
        Ok(self.execute("currentsong", &[]).await?.into_attrs())
    }

    async fn playlist_changes(&self, version: u32) -> Result<Vec<Attrs>, MpdError> {
        Ok(self
            .execute("plchanges", &[version.to_string()])
            .await?
            .into_songs())
    }

    async fn playlist_info(&self) -> Result<Vec<Attrs>, MpdError> {
        Ok(self.execute("playlistinfo", &[]).await?.into_songs())
    }

    async fn issue(&self, command: Command) -> Result<(), MpdError> {
        debug!(%command, "Issuing MPD command");
        self.execute(command.name(), &command.args()).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), MpdError> {
        self.execute("ping", &[]).await?;
        Ok(())
    }

    async fn wait_for_change(
        &self,
        subsystems: &[Subsystem],
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, MpdError> {
        let mut conn = self.watcher.lock().await;
        let args: Vec<String> = subsystems.iter().map(|s| s.as_str().to_string()).collect();
        conn.send("idle", &args).await?;

        tokio::select! {
            () = cancel.cancelled() => Ok(WaitOutcome::Cancelled),
            response = conn.read_response("idle") => {
                let changed = response?.values("changed").map(Subsystem::from).collect();
                Ok(WaitOutcome::Changed(changed))
            }
        }
    }

    async fn album_art(&self, path: &str) -> Result<Vec<u8>, MpdError> {
        match self.read_binary("readpicture", path).await {
            Ok(data) if !data.is_empty() => Ok(data),
            Ok(_) | Err(MpdError::Ack { .. }) => self.read_binary("albumart", path).await,
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_addresses() {
        assert_eq!(
            Address::local("/run/mpd/socket"),
            Address::Unix(PathBuf::from("/run/mpd/socket"))
        );
        assert_eq!(Address::local("@mpd"), Address::Abstract("mpd".to_string()));
        assert_eq!(Address::local("@mpd").to_string(), "@mpd");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn connects_to_abstract_socket() {
        use std::os::{
            linux::net::SocketAddrExt,
            unix::net::{SocketAddr, UnixListener},
        };

        let name = format!("mpd-mpris-test-{}", std::process::id());
        let addr = SocketAddr::from_abstract_name(name.as_bytes()).unwrap();
        let listener = UnixListener::bind_addr(&addr).unwrap();

        let stream = connect_abstract(&name).await.unwrap();
        let (_accepted, peer) = listener.accept().unwrap();

        assert!(peer.is_unnamed());
        assert!(stream.peer_addr().is_ok());
    }

    #[test]
    fn displays_address() {
        let addr = Address::Tcp {
            host: "localhost".to_string(),
            port: 6600,
        };
        assert_eq!(addr.to_string(), "localhost:6600");
    }
}

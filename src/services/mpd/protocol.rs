use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use super::{Attrs, MpdError};

type Reader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// One complete answer to a command
#[derive(Debug, Default)]
pub(super) struct Response {
    pairs: Vec<(String, String)>,
    binary: Option<Vec<u8>>,
}

impl Response {
    /// Collapse the answer into a single record
    pub(super) fn into_attrs(self) -> Attrs {
        self.pairs.into_iter().collect()
    }

    /// Split a song list into one record per song.
    ///
    /// Every song record starts with its `file` key.
    pub(super) fn into_songs(self) -> Vec<Attrs> {
        let mut songs = Vec::new();
        let mut current: Option<Attrs> = None;

        for (key, value) in self.pairs {
            if key == "file" {
                if let Some(done) = current.take() {
                    songs.push(done);
                }
                current = Some(Attrs::new());
            }
            if let Some(record) = current.as_mut() {
                record.insert(key, value);
            }
        }

        songs.extend(current);
        songs
    }

    /// Values of every pair with the given key, in order
    pub(super) fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for the given key
    pub(super) fn value<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        self.values(key).next()
    }

    /// Binary payload, if the answer carried one
    pub(super) fn take_binary(&mut self) -> Option<Vec<u8>> {
        self.binary.take()
    }
}

/// A single connection speaking the MPD line protocol
pub(super) struct Connection {
    reader: Reader,
    writer: Writer,
    version: String,
}

impl Connection {
    /// Wrap a stream pair and consume the `OK MPD <version>` greeting
    pub(super) async fn handshake(
        reader: Box<dyn AsyncRead + Send + Unpin>,
        writer: Writer,
    ) -> Result<Self, MpdError> {
        let mut conn = Self {
            reader: BufReader::new(reader),
            writer,
            version: String::new(),
        };

        let greeting = conn.read_line().await?;
        conn.version = greeting
            .strip_prefix("OK MPD ")
            .ok_or_else(|| MpdError::Protocol(format!("unexpected greeting `{greeting}`")))?
            .to_string();

        Ok(conn)
    }

    /// Protocol version announced by the daemon
    pub(super) fn version(&self) -> &str {
        &self.version
    }

    /// Send a command and read its complete answer
    pub(super) async fn execute(
        &mut self,
        name: &str,
        args: &[String],
    ) -> Result<Response, MpdError> {
        self.send(name, args).await?;
        self.read_response(name).await
    }

    /// Send a command without waiting for the answer
    pub(super) async fn send(&mut self, name: &str, args: &[String]) -> Result<(), MpdError> {
        let line = command_line(name, args);
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read lines until `OK` or `ACK`
    pub(super) async fn read_response(&mut self, command: &str) -> Result<Response, MpdError> {
        let mut response = Response::default();

        loop {
            let line = self.read_line().await?;
            if line == "OK" {
                return Ok(response);
            }
            if let Some(ack) = line.strip_prefix("ACK ") {
                return Err(parse_ack(ack, command));
            }

            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| MpdError::Protocol(format!("malformed line `{line}`")))?;

            if key == "binary" {
                let len: usize = value
                    .parse()
                    .map_err(|_| MpdError::Protocol(format!("bad binary length `{value}`")))?;
                let mut data = vec![0; len];
                self.reader.read_exact(&mut data).await?;
                let mut terminator = [0u8; 1];
                self.reader.read_exact(&mut terminator).await?;
                response.binary = Some(data);
                continue;
            }

            response.pairs.push((key.to_string(), value.to_string()));
        }
    }

    async fn read_line(&mut self) -> Result<String, MpdError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(MpdError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

fn command_line(name: &str, args: &[String]) -> String {
    let mut line = name.to_string();
    for arg in args {
        line.push(' ');
        line.push('"');
        line.push_str(&arg.replace('\\', "\\\\").replace('"', "\\\""));
        line.push('"');
    }
    line.push('\n');
    line
}

/// `ACK [<code>@<index>] {<command>} <message>`
fn parse_ack(ack: &str, command: &str) -> MpdError {
    let code = ack
        .strip_prefix('[')
        .and_then(|rest| rest.split_once('@'))
        .and_then(|(code, _)| code.parse().ok())
        .unwrap_or(0);
    let message = ack.split_once("} ").map_or(ack, |(_, message)| message);

    MpdError::Ack {
        code,
        command: command.to_string(),
        message: message.to_string(),
    }
}

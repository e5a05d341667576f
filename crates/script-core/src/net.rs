//! Callback-driven TCP socket and server wrappers over [`SocketHost`].
//!
//! Host requests complete asynchronously. The embedding event loop hands
//! each completion back through the `deliver_*` methods.

use std::collections::VecDeque;
use std::fmt;

use crate::{ScriptError, SessionConfig, SocketFd, SocketHost};

/// Handler for received bytes.
pub type DataHandler = Box<dyn FnMut(&[u8])>;

/// Handler for connect and close events.
pub type EventHandler = Box<dyn FnMut()>;

/// Handler for clients accepted by a [`Server`].
pub type ConnectionHandler = Box<dyn FnMut(Socket)>;

/// Connect target; absent parts fall back to the session defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOptions<'a> {
    /// Remote host name or address.
    pub host: Option<&'a str>,
    /// Remote port.
    pub port: Option<u16>,
}

/// Client socket.
pub struct Socket {
    fd: SocketFd,
    connected: bool,
    buffer_size: usize,
    default_host: String,
    default_port: u16,
    ondata: Option<DataHandler>,
    onclose: Option<EventHandler>,
    onconnect: Option<EventHandler>,
    pending_writes: VecDeque<Option<EventHandler>>,
}

impl Socket {
    /// Allocates a fresh descriptor with default settings.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn new<H: SocketHost + ?Sized>(host: &mut H) -> Result<Self, ScriptError> {
        Self::with_config(host, &SessionConfig::default())
    }

    /// Allocates a fresh descriptor using `config` defaults.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn with_config<H: SocketHost + ?Sized>(
        host: &mut H,
        config: &SessionConfig,
    ) -> Result<Self, ScriptError> {
        let fd = host.create()?;
        Ok(Self::from_fd(fd, false, config))
    }

    /// Wraps a descriptor the host already connected (accepted clients).
    #[must_use]
    pub fn accepted(fd: SocketFd, config: &SessionConfig) -> Self {
        Self::from_fd(fd, true, config)
    }

    fn from_fd(fd: SocketFd, connected: bool, config: &SessionConfig) -> Self {
        Self {
            fd,
            connected,
            buffer_size: config.socket_buffer_size,
            default_host: config.connect_host.clone(),
            default_port: config.connect_port,
            ondata: None,
            onclose: None,
            onconnect: None,
            pending_writes: VecDeque::new(),
        }
    }

    /// Host descriptor.
    #[must_use]
    pub const fn fd(&self) -> SocketFd {
        self.fd
    }

    /// `true` once connected and until end of stream.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Size requested by each read.
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Starts connecting. Does nothing when already connected.
    ///
    /// `on_connect` runs from [`Socket::deliver_connect`].
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn connect<H: SocketHost + ?Sized>(
        &mut self,
        host: &mut H,
        options: ConnectOptions<'_>,
        on_connect: impl FnMut() + 'static,
    ) -> Result<(), ScriptError> {
        if self.connected {
            return Ok(());
        }
        let target = options.host.unwrap_or(&self.default_host);
        let port = options.port.unwrap_or(self.default_port);
        host.connect(self.fd, target, port)?;
        log::debug!("socket {}: connecting to {target}:{port}", self.fd.0);
        self.onconnect = Some(Box::new(on_connect));
        Ok(())
    }

    /// Host completion of a connect request.
    pub fn deliver_connect(&mut self) {
        self.connected = true;
        if let Some(handler) = self.onconnect.as_mut() {
            handler();
        }
    }

    /// Installs the data handler and arms the read loop.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn on_data<H: SocketHost + ?Sized>(
        &mut self,
        host: &mut H,
        handler: impl FnMut(&[u8]) + 'static,
    ) -> Result<(), ScriptError> {
        self.ondata = Some(Box::new(handler));
        host.read(self.fd, self.buffer_size)?;
        Ok(())
    }

    /// Installs the close handler. It only runs once a read loop is armed.
    pub fn on_close(&mut self, handler: impl FnMut() + 'static) {
        self.onclose = Some(Box::new(handler));
    }

    /// Host completion of a read request; `None` marks end of stream.
    ///
    /// The next read is requested before the data handler runs.
    ///
    /// # Errors
    ///
    /// Returns the host failure from re-arming the read; the data handler
    /// does not run in that case.
    pub fn deliver_read<H: SocketHost + ?Sized>(
        &mut self,
        host: &mut H,
        data: Option<&[u8]>,
    ) -> Result<(), ScriptError> {
        let Some(data) = data else {
            self.connected = false;
            log::debug!("socket {}: closed by peer", self.fd.0);
            if let Some(handler) = self.onclose.as_mut() {
                handler();
            }
            return Ok(());
        };
        host.read(self.fd, self.buffer_size)?;
        if let Some(handler) = self.ondata.as_mut() {
            handler(data);
        }
        Ok(())
    }

    /// Queues `data` for sending.
    ///
    /// `on_written` runs from the matching [`Socket::deliver_write`].
    /// Completions arrive in request order.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged; `on_written` is dropped.
    pub fn write<H: SocketHost + ?Sized>(
        &mut self,
        host: &mut H,
        data: &[u8],
        on_written: Option<EventHandler>,
    ) -> Result<(), ScriptError> {
        host.write(self.fd, data)?;
        self.pending_writes.push_back(on_written);
        Ok(())
    }

    /// Host completion of the oldest outstanding write.
    pub fn deliver_write(&mut self) {
        match self.pending_writes.pop_front() {
            Some(Some(mut handler)) => handler(),
            Some(None) => {}
            None => log::warn!("socket {}: write completed with none outstanding", self.fd.0),
        }
    }

    /// Writes not yet completed by the host.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.pending_writes.len()
    }

    /// Closes the descriptor.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn close<H: SocketHost + ?Sized>(&mut self, host: &mut H) -> Result<(), ScriptError> {
        host.close(self.fd)?;
        self.connected = false;
        Ok(())
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("fd", &self.fd)
            .field("connected", &self.connected)
            .field("buffer_size", &self.buffer_size)
            .field("pending_writes", &self.pending_writes.len())
            .finish_non_exhaustive()
    }
}

/// Listening socket that wraps each accepted client in a [`Socket`].
pub struct Server {
    fd: SocketFd,
    config: SessionConfig,
    onconnection: Option<ConnectionHandler>,
}

impl Server {
    /// Allocates a descriptor and, when `port` is given, starts listening.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn new<H: SocketHost + ?Sized>(host: &mut H, port: Option<u16>) -> Result<Self, ScriptError> {
        Self::with_config(host, port, SessionConfig::default())
    }

    /// Like [`Server::new`], handing `config` on to accepted clients.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn with_config<H: SocketHost + ?Sized>(
        host: &mut H,
        port: Option<u16>,
        config: SessionConfig,
    ) -> Result<Self, ScriptError> {
        let fd = host.create()?;
        let mut server = Self {
            fd,
            config,
            onconnection: None,
        };
        if let Some(port) = port {
            server.listen(host, port)?;
        }
        Ok(server)
    }

    /// Host descriptor.
    #[must_use]
    pub const fn fd(&self) -> SocketFd {
        self.fd
    }

    /// Binds and listens on `port`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn listen<H: SocketHost + ?Sized>(&mut self, host: &mut H, port: u16) -> Result<(), ScriptError> {
        host.listen(self.fd, port)?;
        log::debug!("server {}: listening on {port}", self.fd.0);
        Ok(())
    }

    /// Installs the connection handler and requests the first client.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    pub fn on_connection<H: SocketHost + ?Sized>(
        &mut self,
        host: &mut H,
        handler: impl FnMut(Socket) + 'static,
    ) -> Result<(), ScriptError> {
        self.onconnection = Some(Box::new(handler));
        host.accept(self.fd)?;
        Ok(())
    }

    /// Host completion of an accept request.
    ///
    /// Hands the client to the connection handler, then requests the next
    /// client.
    ///
    /// # Errors
    ///
    /// Returns the host failure from re-arming `accept`.
    pub fn deliver_accept<H: SocketHost + ?Sized>(
        &mut self,
        host: &mut H,
        client: SocketFd,
    ) -> Result<(), ScriptError> {
        let socket = Socket::accepted(client, &self.config);
        log::debug!("server {}: accepted client {}", self.fd.0, client.0);
        if let Some(handler) = self.onconnection.as_mut() {
            handler(socket);
        }
        host.accept(self.fd)?;
        Ok(())
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("fd", &self.fd)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

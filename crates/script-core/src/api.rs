//! Host-facing contracts an embedding emulator implements, plus session
//! configuration.
//!
//! Each trait covers one concern of the host primitive table. The core only
//! marshals arguments and results; it never checks addresses, register
//! indices or descriptors before forwarding them.

use std::fmt;
use std::sync::Arc;

use crate::{HookCallback, HookKind, HostError};

/// Default receive buffer size for socket read loops.
pub const DEFAULT_SOCKET_BUFFER_SIZE: usize = 2048;

/// Default host for `Socket::connect` when none is given.
pub const DEFAULT_CONNECT_HOST: &str = "127.0.0.1";

/// Default port for `Socket::connect` when none is given.
pub const DEFAULT_CONNECT_PORT: u16 = 80;

/// Default minimum digit count for hex formatting.
pub const DEFAULT_HEX_DIGITS: usize = 8;

/// Byte-addressable memory space exposed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemorySpace {
    /// Emulated main memory (RDRAM).
    Main,
    /// Cartridge ROM image.
    Rom,
}

impl fmt::Display for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Main => "main memory",
            Self::Rom => "rom",
        })
    }
}

/// Register file primitives.
///
/// GPR values are exchanged as 32-bit words and FPR values as single
/// precision floats. `PC` lives outside the 0..31 index range.
pub trait RegisterHost {
    /// Reads general-purpose register `index`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn gpr(&mut self, index: u32) -> Result<u32, HostError>;

    /// Writes general-purpose register `index`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn set_gpr(&mut self, index: u32, value: u32) -> Result<(), HostError>;

    /// Reads floating-point register `index`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn fpr(&mut self, index: u32) -> Result<f32, HostError>;

    /// Writes floating-point register `index`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn set_fpr(&mut self, index: u32, value: f32) -> Result<(), HostError>;

    /// Reads the program counter.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn pc(&mut self) -> Result<u32, HostError>;

    /// Writes the program counter.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn set_pc(&mut self, value: u32) -> Result<(), HostError>;
}

/// Memory primitives for main memory and ROM.
///
/// The core never calls the integer/block/string writers with
/// [`MemorySpace::Rom`]; ROM accepts float and double writes only.
pub trait MemoryHost {
    /// Reads an integer of `bits` width, sign-extending when `signed`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn read_int(
        &mut self,
        space: MemorySpace,
        address: u32,
        bits: u32,
        signed: bool,
    ) -> Result<i64, HostError>;

    /// Writes the low `bits` of `value`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn write_int(
        &mut self,
        space: MemorySpace,
        address: u32,
        bits: u32,
        value: i64,
    ) -> Result<(), HostError>;

    /// Reads a float, or a double when `double` is set.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn read_float(
        &mut self,
        space: MemorySpace,
        address: u32,
        double: bool,
    ) -> Result<f64, HostError>;

    /// Writes a float, or a double when `double` is set.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn write_float(
        &mut self,
        space: MemorySpace,
        address: u32,
        value: f64,
        double: bool,
    ) -> Result<(), HostError>;

    /// Reads `size` raw bytes.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn read_block(
        &mut self,
        space: MemorySpace,
        address: u32,
        size: usize,
    ) -> Result<Vec<u8>, HostError>;

    /// Writes raw bytes.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn write_block(
        &mut self,
        space: MemorySpace,
        address: u32,
        data: &[u8],
    ) -> Result<(), HostError>;

    /// Reads a null-terminated string.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn read_string(&mut self, space: MemorySpace, address: u32) -> Result<String, HostError>;

    /// Writes `text` followed by a terminating null byte.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn write_string(
        &mut self,
        space: MemorySpace,
        address: u32,
        text: &str,
    ) -> Result<(), HostError>;
}

/// Host-side handle identifying one installed hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHookId(pub u32);

/// Breakpoint-style hook installation.
pub trait HookHost {
    /// Installs `callback` for `kind` accesses scoped by `tag`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn add_callback(
        &mut self,
        kind: HookKind,
        tag: u32,
        callback: HookCallback,
    ) -> Result<HostHookId, HostError>;

    /// Removes a previously installed hook.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn remove_callback(&mut self, id: HostHookId) -> Result<(), HostError>;
}

/// Unbuffered text sink of the script console window.
pub trait ConsoleHost {
    /// Appends `text` verbatim.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn print(&mut self, text: &str) -> Result<(), HostError>;

    /// Clears the console.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn clear(&mut self) -> Result<(), HostError>;
}

/// Modal dialog support.
pub trait DialogHost {
    /// Shows a modal message box.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn message_box(&mut self, text: &str, caption: &str) -> Result<(), HostError>;
}

/// Emulator lifecycle controls. All calls are fire-and-forget.
#[allow(missing_docs, clippy::missing_errors_doc)]
pub trait SystemHost {
    fn pause(&mut self) -> Result<(), HostError>;
    fn resume(&mut self) -> Result<(), HostError>;
    fn reset(&mut self) -> Result<(), HostError>;
    fn hard_reset(&mut self) -> Result<(), HostError>;
    fn save_state(&mut self) -> Result<(), HostError>;
    fn load_state(&mut self) -> Result<(), HostError>;
    fn set_save_slot(&mut self, slot: u32) -> Result<(), HostError>;
    fn save_slot(&mut self) -> Result<u32, HostError>;
    fn generate_bitmap(&mut self) -> Result<(), HostError>;
}

/// Debugger window controls.
pub trait DebugHost {
    /// Opens the memory viewer at `address`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn show_memory(&mut self, address: u32) -> Result<(), HostError>;

    /// Opens the commands (disassembly) view at `address`.
    ///
    /// # Errors
    ///
    /// Returns the host failure unchanged.
    fn show_commands(&mut self, address: u32) -> Result<(), HostError>;
}

/// Host socket descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketFd(pub u32);

/// Descriptor-based socket primitives.
///
/// Requests are asynchronous: completions are handed back to the owning
/// `Socket`/`Server` wrapper by the host event loop.
#[allow(clippy::missing_errors_doc)]
pub trait SocketHost {
    /// Allocates a new descriptor.
    fn create(&mut self) -> Result<SocketFd, HostError>;
    /// Starts connecting `fd` to `host:port`.
    fn connect(&mut self, fd: SocketFd, host: &str, port: u16) -> Result<(), HostError>;
    /// Binds and listens on `port`.
    fn listen(&mut self, fd: SocketFd, port: u16) -> Result<(), HostError>;
    /// Requests the next incoming client on a listening descriptor.
    fn accept(&mut self, fd: SocketFd) -> Result<(), HostError>;
    /// Requests up to `size` bytes.
    fn read(&mut self, fd: SocketFd, size: usize) -> Result<(), HostError>;
    /// Queues `data` for sending.
    fn write(&mut self, fd: SocketFd, data: &[u8]) -> Result<(), HostError>;
    /// Closes the descriptor.
    fn close(&mut self, fd: SocketFd) -> Result<(), HostError>;
}

/// Host OS thread handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadHandle(pub u64);

/// Procedure run on a host thread.
///
/// Shared so a start rejected by the host can be retried.
pub type ThreadProc = Arc<dyn Fn() + Send + Sync + 'static>;

/// Host thread primitives.
#[allow(clippy::missing_errors_doc)]
pub trait ThreadHost {
    /// Spawns `proc` on a new host thread.
    fn create_thread(&mut self, proc: ThreadProc) -> Result<ThreadHandle, HostError>;
    /// Suspends a running thread.
    fn suspend_thread(&mut self, handle: ThreadHandle) -> Result<(), HostError>;
    /// Resumes a suspended thread.
    fn resume_thread(&mut self, handle: ThreadHandle) -> Result<(), HostError>;
    /// Terminates a thread.
    fn terminate_thread(&mut self, handle: ThreadHandle) -> Result<(), HostError>;
    /// Blocks the calling thread for `ms` milliseconds.
    fn sleep(&mut self, ms: u32) -> Result<(), HostError>;
}

/// Host surface required by a [`crate::ScriptSession`].
pub trait Host: RegisterHost + MemoryHost + HookHost + ConsoleHost {}

impl<T: RegisterHost + MemoryHost + HookHost + ConsoleHost + ?Sized> Host for T {}

/// Top-level configuration for a scripting session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SessionConfig {
    /// Buffer size requested by socket read loops.
    pub socket_buffer_size: usize,
    /// Host used by `Socket::connect` when the script gives none.
    pub connect_host: String,
    /// Port used by `Socket::connect` when the script gives none.
    pub connect_port: u16,
    /// Minimum digit count used by [`crate::hex`].
    pub hex_digits: usize,
    /// Print script failures to the console sink.
    pub report_errors_to_console: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            socket_buffer_size: DEFAULT_SOCKET_BUFFER_SIZE,
            connect_host: DEFAULT_CONNECT_HOST.to_owned(),
            connect_port: DEFAULT_CONNECT_PORT,
            hex_digits: DEFAULT_HEX_DIGITS,
            report_errors_to_console: true,
        }
    }
}

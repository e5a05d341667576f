//! Core of the emulator scripting API: typed memory and register access,
//! struct binding, hook registration and thin host service wrappers.

/// Error taxonomy shared by every scripting operation.
pub mod error;
pub use error::{ErrorClass, HostError, ScriptError, ScriptResult};

/// Host-facing contracts and session configuration.
pub mod api;
pub use api::{
    ConsoleHost, DebugHost, DialogHost, Host, HookHost, HostHookId, MemoryHost, MemorySpace,
    RegisterHost, SessionConfig, SocketFd, SocketHost, SystemHost, ThreadHandle, ThreadHost,
    ThreadProc, DEFAULT_CONNECT_HOST, DEFAULT_CONNECT_PORT, DEFAULT_HEX_DIGITS,
    DEFAULT_SOCKET_BUFFER_SIZE,
};

/// Primitive type registry and decoded values.
pub mod types;
pub use types::{Encoding, FloatScalar, PrimitiveType, Scalar, Value};

/// GPR/FPR name table and accessors.
pub mod registers;
pub use registers::{fpr_index, gpr_index, Fpr, Gpr, GprTarget, FPR_NAMES, GPR_NAMES, REGISTER_COUNT};

/// Main memory and ROM accessors, struct layouts and bindings.
pub mod memory;
pub use memory::{
    bindstruct, bindvar, bindvars, read_value, typedef, write_value, Accessor, BoundObject,
    FieldDescriptor, LayoutField, Memory, Rom, RomAccessor, StructLayout, StructType, VarBinding,
};

/// Hook registry for exec/read/write callbacks.
pub mod events;
pub use events::{CallbackId, HookCallback, HookHandle, HookKind, HookRegistry, Registration};

/// Script console and alerts.
pub mod console;
pub use console::{alert, log_line, report_error, Console, LINE_END};

/// Emulator lifecycle and debugger controls.
pub mod system;
pub use system::{Debugger, System};

/// Host thread wrapper.
pub mod thread;
pub use thread::{Thread, ThreadState};

/// Callback-driven sockets.
pub mod net;
pub use net::{ConnectOptions, ConnectionHandler, DataHandler, EventHandler, Server, Socket};

/// Hex formatting helpers.
pub mod hex;
pub use hex::{hex, hex_width, ToHex};

/// Session facade tying the pieces together.
pub mod session;
pub use session::ScriptSession;

#[cfg(test)]
mod test_support;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Uint8Array};
use script_core::{
    hex_width, report_error, CallbackId, ConnectOptions, ConsoleHost, DebugHost, DialogHost,
    EventHandler, FieldDescriptor, HookCallback, HookHost, HookKind, HostError, HostHookId,
    MemoryHost, MemorySpace, PrimitiveType, RegisterHost, ScriptError, ScriptSession, Server,
    SessionConfig, Socket, SocketFd, SocketHost, StructLayout, StructType, SystemHost, Thread,
    ThreadHandle, ThreadHost, ThreadProc, Value, LINE_END,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);

    /// Host primitive table provided by the embedding emulator.
    #[derive(Clone)]
    pub type Native;

    #[wasm_bindgen(method, catch, js_name = getGPRVal)]
    fn get_gpr_val(this: &Native, index: u32) -> Result<u32, JsValue>;
    #[wasm_bindgen(method, catch, js_name = setGPRVal)]
    fn set_gpr_val(this: &Native, index: u32, value: u32) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = getFPRVal)]
    fn get_fpr_val(this: &Native, index: u32) -> Result<f32, JsValue>;
    #[wasm_bindgen(method, catch, js_name = setFPRVal)]
    fn set_fpr_val(this: &Native, index: u32, value: f32) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = getPCVal)]
    fn get_pc_val(this: &Native) -> Result<u32, JsValue>;
    #[wasm_bindgen(method, catch, js_name = setPCVal)]
    fn set_pc_val(this: &Native, value: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = getRDRAMInt)]
    fn get_rdram_int(this: &Native, address: u32, bits: u32, signed: bool) -> Result<f64, JsValue>;
    #[wasm_bindgen(method, catch, js_name = setRDRAMInt)]
    fn set_rdram_int(this: &Native, address: u32, bits: u32, value: f64) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = getRDRAMFloat)]
    fn get_rdram_float(this: &Native, address: u32, double: bool) -> Result<f64, JsValue>;
    #[wasm_bindgen(method, catch, js_name = setRDRAMFloat)]
    fn set_rdram_float(this: &Native, address: u32, value: f64, double: bool) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = getRDRAMBlock)]
    fn get_rdram_block(this: &Native, address: u32, size: u32) -> Result<Uint8Array, JsValue>;
    #[wasm_bindgen(method, catch, js_name = setRDRAMBlock)]
    fn set_rdram_block(this: &Native, address: u32, data: &[u8]) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = getRDRAMString)]
    fn get_rdram_string(this: &Native, address: u32) -> Result<String, JsValue>;
    #[wasm_bindgen(method, catch, js_name = setRDRAMString)]
    fn set_rdram_string(this: &Native, address: u32, text: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = getROMInt)]
    fn get_rom_int(this: &Native, address: u32, bits: u32, signed: bool) -> Result<f64, JsValue>;
    #[wasm_bindgen(method, catch, js_name = getROMFloat)]
    fn get_rom_float(this: &Native, address: u32, double: bool) -> Result<f64, JsValue>;
    #[wasm_bindgen(method, catch, js_name = setROMFloat)]
    fn set_rom_float(this: &Native, address: u32, value: f64, double: bool) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = getROMBlock)]
    fn get_rom_block(this: &Native, address: u32, size: u32) -> Result<Uint8Array, JsValue>;
    #[wasm_bindgen(method, catch, js_name = getROMString)]
    fn get_rom_string(this: &Native, address: u32) -> Result<String, JsValue>;

    #[wasm_bindgen(method, catch, js_name = addCallback)]
    fn add_callback(this: &Native, hook: &str, callback: &Function, tag: u32) -> Result<u32, JsValue>;
    #[wasm_bindgen(method, catch, js_name = removeCallback)]
    fn remove_callback(this: &Native, id: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = consolePrint)]
    fn console_print(this: &Native, text: &str) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = consoleClear)]
    fn console_clear(this: &Native) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = msgBox)]
    fn msg_box(this: &Native, text: &str, caption: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn pause(this: &Native) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch)]
    fn resume(this: &Native) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch)]
    fn reset(this: &Native) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = hardReset)]
    fn hard_reset(this: &Native) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = saveState)]
    fn save_state(this: &Native) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = loadState)]
    fn load_state(this: &Native) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = setSaveSlot)]
    fn set_save_slot(this: &Native, slot: u32) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = getSaveSlot)]
    fn get_save_slot(this: &Native) -> Result<u32, JsValue>;
    #[wasm_bindgen(method, catch, js_name = generateBitmap)]
    fn generate_bitmap(this: &Native) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = showMemory)]
    fn show_memory(this: &Native, address: u32) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = showCommands)]
    fn show_commands(this: &Native, address: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = sockCreate)]
    fn sock_create(this: &Native) -> Result<u32, JsValue>;
    #[wasm_bindgen(method, catch, js_name = sockConnect)]
    fn sock_connect(
        this: &Native,
        fd: u32,
        host: &str,
        port: u16,
        callback: &JsValue,
    ) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = sockListen)]
    fn sock_listen(this: &Native, fd: u32, port: u16) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = sockAccept)]
    fn sock_accept(this: &Native, fd: u32, callback: &JsValue) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = read)]
    fn sock_read(this: &Native, fd: u32, size: u32, callback: &JsValue) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = write)]
    fn sock_write(this: &Native, fd: u32, data: &[u8], callback: &JsValue) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = close)]
    fn sock_close(this: &Native, fd: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = createThread)]
    fn create_thread(this: &Native, proc: &Function) -> Result<f64, JsValue>;
    #[wasm_bindgen(method, catch, js_name = suspendThread)]
    fn suspend_thread(this: &Native, handle: f64) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = resumeThread)]
    fn resume_thread(this: &Native, handle: f64) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch, js_name = terminateThread)]
    fn terminate_thread(this: &Native, handle: f64) -> Result<(), JsValue>;
    #[wasm_bindgen(method, catch)]
    fn sleep(this: &Native, ms: u32) -> Result<(), JsValue>;
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format!($($t)*)))
}

thread_local! {
    // Thread procedures must be `Send`, so they carry a key into this table
    // instead of the JS function itself.
    static THREAD_PROCS: RefCell<HashMap<u32, (Function, Native)>> = RefCell::new(HashMap::new());
}

fn js_message(err: &JsValue) -> String {
    err.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}

fn host_error(call: &'static str, err: &JsValue) -> HostError {
    HostError::new(call, js_message(err))
}

fn read_only(call: &'static str) -> HostError {
    HostError::new(call, "rom accepts float and double writes only")
}

fn to_js(err: &ScriptError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn busy() -> JsValue {
    js_sys::Error::new("script session is busy").into()
}

fn unknown_descriptor(kind: &str, fd: u32) -> JsValue {
    js_sys::Error::new(&format!("no {kind} with descriptor {fd}")).into()
}

/// Console line for an exception thrown by a script callback.
fn error_line(message: &str) -> String {
    format!("error: {message}{LINE_END}")
}

/// Calls a script callback, reporting a thrown exception to the script
/// console.
fn invoke(native: &Native, callback: &Function, args: &[JsValue]) {
    let args: Array = args.iter().collect();
    if let Err(err) = callback.apply(&JsValue::NULL, &args) {
        let line = error_line(&js_message(&err));
        if native.console_print(&line).is_err() {
            console_log!("{}", line.trim_end());
        }
    }
}

fn run_thread_proc(key: u32) {
    let entry = THREAD_PROCS.with(|procs| procs.borrow().get(&key).cloned());
    if let Some((callback, native)) = entry {
        invoke(&native, &callback, &[]);
    }
}

fn received_bytes(data: &JsValue) -> Option<Vec<u8>> {
    if data.is_null() || data.is_undefined() {
        return None;
    }
    Some(match data.as_string() {
        Some(text) => text.into_bytes(),
        None => Uint8Array::new(data).to_vec(),
    })
}

type Queue<T> = Rc<RefCell<VecDeque<T>>>;

/// Socket request completed by the host event loop.
#[derive(Debug, PartialEq, Eq)]
enum Completion {
    Connected(SocketFd),
    Received(SocketFd, Option<Vec<u8>>),
    Written(SocketFd),
    Accepted { server: SocketFd, client: SocketFd },
}

/// Script callback waiting for the bridge to be released.
struct Invocation {
    callback: Function,
    args: Vec<JsValue>,
}

impl Invocation {
    const fn new(callback: Function, args: Vec<JsValue>) -> Self {
        Self { callback, args }
    }
}

/// Routes host completions back into the session that issued the request.
struct Notifier {
    queue: Queue<Completion>,
    bridge: Weak<RefCell<Bridge>>,
}

impl Notifier {
    fn send(&self, completion: Completion) {
        self.queue.borrow_mut().push_back(completion);
        if let Some(bridge) = self.bridge.upgrade() {
            pump(&bridge);
        }
    }
}

/// Adapts a JS `_native` table to the core host traits.
pub struct JsHost {
    native: Native,
    hooks: HashMap<HostHookId, Closure<dyn Fn(u32)>>,
    threads: HashMap<ThreadHandle, Closure<dyn Fn()>>,
    completions: Queue<Completion>,
    bridge: Weak<RefCell<Bridge>>,
}

impl JsHost {
    #[must_use]
    pub fn new(native: Native) -> Self {
        Self {
            native,
            hooks: HashMap::new(),
            threads: HashMap::new(),
            completions: Rc::default(),
            bridge: Weak::new(),
        }
    }

    fn notifier(&self) -> Notifier {
        Notifier {
            queue: Rc::clone(&self.completions),
            bridge: self.bridge.clone(),
        }
    }
}

impl RegisterHost for JsHost {
    fn gpr(&mut self, index: u32) -> Result<u32, HostError> {
        self.native
            .get_gpr_val(index)
            .map_err(|e| host_error("getGPRVal", &e))
    }

    fn set_gpr(&mut self, index: u32, value: u32) -> Result<(), HostError> {
        self.native
            .set_gpr_val(index, value)
            .map_err(|e| host_error("setGPRVal", &e))
    }

    fn fpr(&mut self, index: u32) -> Result<f32, HostError> {
        self.native
            .get_fpr_val(index)
            .map_err(|e| host_error("getFPRVal", &e))
    }

    fn set_fpr(&mut self, index: u32, value: f32) -> Result<(), HostError> {
        self.native
            .set_fpr_val(index, value)
            .map_err(|e| host_error("setFPRVal", &e))
    }

    fn pc(&mut self) -> Result<u32, HostError> {
        self.native.get_pc_val().map_err(|e| host_error("getPCVal", &e))
    }

    fn set_pc(&mut self, value: u32) -> Result<(), HostError> {
        self.native
            .set_pc_val(value)
            .map_err(|e| host_error("setPCVal", &e))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
impl MemoryHost for JsHost {
    fn read_int(
        &mut self,
        space: MemorySpace,
        address: u32,
        bits: u32,
        signed: bool,
    ) -> Result<i64, HostError> {
        let raw = match space {
            MemorySpace::Main => self
                .native
                .get_rdram_int(address, bits, signed)
                .map_err(|e| host_error("getRDRAMInt", &e)),
            MemorySpace::Rom => self
                .native
                .get_rom_int(address, bits, signed)
                .map_err(|e| host_error("getROMInt", &e)),
        }?;
        Ok(raw as i64)
    }

    fn write_int(
        &mut self,
        space: MemorySpace,
        address: u32,
        bits: u32,
        value: i64,
    ) -> Result<(), HostError> {
        match space {
            MemorySpace::Main => self
                .native
                .set_rdram_int(address, bits, value as f64)
                .map_err(|e| host_error("setRDRAMInt", &e)),
            MemorySpace::Rom => Err(read_only("setROMInt")),
        }
    }

    fn read_float(&mut self, space: MemorySpace, address: u32, double: bool) -> Result<f64, HostError> {
        match space {
            MemorySpace::Main => self
                .native
                .get_rdram_float(address, double)
                .map_err(|e| host_error("getRDRAMFloat", &e)),
            MemorySpace::Rom => self
                .native
                .get_rom_float(address, double)
                .map_err(|e| host_error("getROMFloat", &e)),
        }
    }

    fn write_float(
        &mut self,
        space: MemorySpace,
        address: u32,
        value: f64,
        double: bool,
    ) -> Result<(), HostError> {
        match space {
            MemorySpace::Main => self
                .native
                .set_rdram_float(address, value, double)
                .map_err(|e| host_error("setRDRAMFloat", &e)),
            MemorySpace::Rom => self
                .native
                .set_rom_float(address, value, double)
                .map_err(|e| host_error("setROMFloat", &e)),
        }
    }

    fn read_block(&mut self, space: MemorySpace, address: u32, size: usize) -> Result<Vec<u8>, HostError> {
        let size = u32::try_from(size).map_err(|_| HostError::new("getRDRAMBlock", "size exceeds 32 bits"))?;
        let block = match space {
            MemorySpace::Main => self
                .native
                .get_rdram_block(address, size)
                .map_err(|e| host_error("getRDRAMBlock", &e)),
            MemorySpace::Rom => self
                .native
                .get_rom_block(address, size)
                .map_err(|e| host_error("getROMBlock", &e)),
        }?;
        Ok(block.to_vec())
    }

    fn write_block(&mut self, space: MemorySpace, address: u32, data: &[u8]) -> Result<(), HostError> {
        match space {
            MemorySpace::Main => self
                .native
                .set_rdram_block(address, data)
                .map_err(|e| host_error("setRDRAMBlock", &e)),
            MemorySpace::Rom => Err(read_only("setROMBlock")),
        }
    }

    fn read_string(&mut self, space: MemorySpace, address: u32) -> Result<String, HostError> {
        match space {
            MemorySpace::Main => self
                .native
                .get_rdram_string(address)
                .map_err(|e| host_error("getRDRAMString", &e)),
            MemorySpace::Rom => self
                .native
                .get_rom_string(address)
                .map_err(|e| host_error("getROMString", &e)),
        }
    }

    fn write_string(&mut self, space: MemorySpace, address: u32, text: &str) -> Result<(), HostError> {
        match space {
            MemorySpace::Main => self
                .native
                .set_rdram_string(address, text)
                .map_err(|e| host_error("setRDRAMString", &e)),
            MemorySpace::Rom => Err(read_only("setROMString")),
        }
    }
}

impl HookHost for JsHost {
    fn add_callback(
        &mut self,
        kind: HookKind,
        tag: u32,
        callback: HookCallback,
    ) -> Result<HostHookId, HostError> {
        let closure = Closure::<dyn Fn(u32)>::new(move |address: u32| callback(address));
        let id = self
            .native
            .add_callback(kind.as_str(), closure.as_ref().unchecked_ref(), tag)
            .map_err(|e| host_error("addCallback", &e))?;
        let id = HostHookId(id);
        self.hooks.insert(id, closure);
        Ok(id)
    }

    fn remove_callback(&mut self, id: HostHookId) -> Result<(), HostError> {
        self.native
            .remove_callback(id.0)
            .map_err(|e| host_error("removeCallback", &e))?;
        self.hooks.remove(&id);
        Ok(())
    }
}

impl ConsoleHost for JsHost {
    fn print(&mut self, text: &str) -> Result<(), HostError> {
        self.native
            .console_print(text)
            .map_err(|e| host_error("consolePrint", &e))
    }

    fn clear(&mut self) -> Result<(), HostError> {
        self.native
            .console_clear()
            .map_err(|e| host_error("consoleClear", &e))
    }
}

impl DialogHost for JsHost {
    fn message_box(&mut self, text: &str, caption: &str) -> Result<(), HostError> {
        self.native
            .msg_box(text, caption)
            .map_err(|e| host_error("msgBox", &e))
    }
}

impl SystemHost for JsHost {
    fn pause(&mut self) -> Result<(), HostError> {
        self.native.pause().map_err(|e| host_error("pause", &e))
    }

    fn resume(&mut self) -> Result<(), HostError> {
        self.native.resume().map_err(|e| host_error("resume", &e))
    }

    fn reset(&mut self) -> Result<(), HostError> {
        self.native.reset().map_err(|e| host_error("reset", &e))
    }

    fn hard_reset(&mut self) -> Result<(), HostError> {
        self.native.hard_reset().map_err(|e| host_error("hardReset", &e))
    }

    fn save_state(&mut self) -> Result<(), HostError> {
        self.native.save_state().map_err(|e| host_error("saveState", &e))
    }

    fn load_state(&mut self) -> Result<(), HostError> {
        self.native.load_state().map_err(|e| host_error("loadState", &e))
    }

    fn set_save_slot(&mut self, slot: u32) -> Result<(), HostError> {
        self.native
            .set_save_slot(slot)
            .map_err(|e| host_error("setSaveSlot", &e))
    }

    fn save_slot(&mut self) -> Result<u32, HostError> {
        self.native
            .get_save_slot()
            .map_err(|e| host_error("getSaveSlot", &e))
    }

    fn generate_bitmap(&mut self) -> Result<(), HostError> {
        self.native
            .generate_bitmap()
            .map_err(|e| host_error("generateBitmap", &e))
    }
}

impl DebugHost for JsHost {
    fn show_memory(&mut self, address: u32) -> Result<(), HostError> {
        self.native
            .show_memory(address)
            .map_err(|e| host_error("showMemory", &e))
    }

    fn show_commands(&mut self, address: u32) -> Result<(), HostError> {
        self.native
            .show_commands(address)
            .map_err(|e| host_error("showCommands", &e))
    }
}

impl SocketHost for JsHost {
    fn create(&mut self) -> Result<SocketFd, HostError> {
        self.native
            .sock_create()
            .map(SocketFd)
            .map_err(|e| host_error("sockCreate", &e))
    }

    fn connect(&mut self, fd: SocketFd, host: &str, port: u16) -> Result<(), HostError> {
        let notifier = self.notifier();
        let done = Closure::once_into_js(move || notifier.send(Completion::Connected(fd)));
        self.native
            .sock_connect(fd.0, host, port, &done)
            .map_err(|e| host_error("sockConnect", &e))
    }

    fn listen(&mut self, fd: SocketFd, port: u16) -> Result<(), HostError> {
        self.native
            .sock_listen(fd.0, port)
            .map_err(|e| host_error("sockListen", &e))
    }

    fn accept(&mut self, fd: SocketFd) -> Result<(), HostError> {
        let notifier = self.notifier();
        let done = Closure::once_into_js(move |client: u32| {
            notifier.send(Completion::Accepted {
                server: fd,
                client: SocketFd(client),
            });
        });
        self.native
            .sock_accept(fd.0, &done)
            .map_err(|e| host_error("sockAccept", &e))
    }

    fn read(&mut self, fd: SocketFd, size: usize) -> Result<(), HostError> {
        let size = u32::try_from(size).map_err(|_| HostError::new("read", "size exceeds 32 bits"))?;
        let notifier = self.notifier();
        let done = Closure::once_into_js(move |data: JsValue| {
            notifier.send(Completion::Received(fd, received_bytes(&data)));
        });
        self.native
            .sock_read(fd.0, size, &done)
            .map_err(|e| host_error("read", &e))
    }

    fn write(&mut self, fd: SocketFd, data: &[u8]) -> Result<(), HostError> {
        let notifier = self.notifier();
        let done = Closure::once_into_js(move || notifier.send(Completion::Written(fd)));
        self.native
            .sock_write(fd.0, data, &done)
            .map_err(|e| host_error("write", &e))
    }

    fn close(&mut self, fd: SocketFd) -> Result<(), HostError> {
        self.native.sock_close(fd.0).map_err(|e| host_error("close", &e))
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
impl ThreadHost for JsHost {
    fn create_thread(&mut self, proc: ThreadProc) -> Result<ThreadHandle, HostError> {
        let closure = Closure::<dyn Fn()>::new(move || proc());
        let handle = self
            .native
            .create_thread(closure.as_ref().unchecked_ref())
            .map_err(|e| host_error("createThread", &e))?;
        let handle = ThreadHandle(handle as u64);
        self.threads.insert(handle, closure);
        Ok(handle)
    }

    fn suspend_thread(&mut self, handle: ThreadHandle) -> Result<(), HostError> {
        self.native
            .suspend_thread(handle.0 as f64)
            .map_err(|e| host_error("suspendThread", &e))
    }

    fn resume_thread(&mut self, handle: ThreadHandle) -> Result<(), HostError> {
        self.native
            .resume_thread(handle.0 as f64)
            .map_err(|e| host_error("resumeThread", &e))
    }

    fn terminate_thread(&mut self, handle: ThreadHandle) -> Result<(), HostError> {
        self.native
            .terminate_thread(handle.0 as f64)
            .map_err(|e| host_error("terminateThread", &e))?;
        self.threads.remove(&handle);
        Ok(())
    }

    fn sleep(&mut self, ms: u32) -> Result<(), HostError> {
        self.native.sleep(ms).map_err(|e| host_error("sleep", &e))
    }
}

/// Session plus the script objects that outlive a single call.
struct Bridge {
    session: ScriptSession<JsHost>,
    sockets: HashMap<u32, Socket>,
    servers: HashMap<u32, Server>,
    threads: HashMap<u32, Thread>,
    next_thread: u32,
    ready: Rc<RefCell<Vec<Invocation>>>,
    adopted: Rc<RefCell<Vec<Socket>>>,
}

impl Bridge {
    fn socket(&mut self, fd: u32) -> Result<(&mut ScriptSession<JsHost>, &mut Socket), JsValue> {
        let socket = self
            .sockets
            .get_mut(&fd)
            .ok_or_else(|| unknown_descriptor("socket", fd))?;
        Ok((&mut self.session, socket))
    }

    fn server(&mut self, fd: u32) -> Result<(&mut ScriptSession<JsHost>, &mut Server), JsValue> {
        let server = self
            .servers
            .get_mut(&fd)
            .ok_or_else(|| unknown_descriptor("server", fd))?;
        Ok((&mut self.session, server))
    }

    fn thread(&mut self, key: u32) -> Result<(&mut ScriptSession<JsHost>, &mut Thread), JsValue> {
        let thread = self
            .threads
            .get_mut(&key)
            .ok_or_else(|| unknown_descriptor("thread", key))?;
        Ok((&mut self.session, thread))
    }

    /// Queues `callback` to run once the bridge is released.
    fn deferred(&self, callback: Function) -> impl Fn(Vec<JsValue>) + 'static {
        let ready = Rc::clone(&self.ready);
        move |args| ready.borrow_mut().push(Invocation::new(callback.clone(), args))
    }

    /// Applies every queued completion and hands back the script callbacks
    /// they triggered.
    fn settle(&mut self) -> Vec<Invocation> {
        let completions = Rc::clone(&self.session.host().completions);
        loop {
            let next = completions.borrow_mut().pop_front();
            let Some(completion) = next else { break };
            if let Err(err) = self.complete(completion) {
                if report_error(self.session.host_mut(), &err).is_err() {
                    console_log!("error: {}", err);
                }
            }
        }
        let adopted: Vec<Socket> = self.adopted.borrow_mut().drain(..).collect();
        for socket in adopted {
            self.sockets.insert(socket.fd().0, socket);
        }
        self.ready.borrow_mut().drain(..).collect()
    }

    fn complete(&mut self, completion: Completion) -> Result<(), ScriptError> {
        let host = self.session.host_mut();
        match completion {
            Completion::Connected(fd) => {
                if let Some(socket) = self.sockets.get_mut(&fd.0) {
                    socket.deliver_connect();
                }
            }
            Completion::Received(fd, data) => {
                if let Some(socket) = self.sockets.get_mut(&fd.0) {
                    socket.deliver_read(host, data.as_deref())?;
                }
            }
            Completion::Written(fd) => {
                if let Some(socket) = self.sockets.get_mut(&fd.0) {
                    socket.deliver_write();
                }
            }
            Completion::Accepted { server, client } => {
                if let Some(server) = self.servers.get_mut(&server.0) {
                    server.deliver_accept(host, client)?;
                }
            }
        }
        Ok(())
    }
}

/// Drains completions and runs the script callbacks they produced. Does
/// nothing while a session call holds the bridge; that call pumps on exit.
fn pump(bridge: &Rc<RefCell<Bridge>>) {
    loop {
        let Ok(mut inner) = bridge.try_borrow_mut() else {
            return;
        };
        let ready = inner.settle();
        let native = inner.session.host().native.clone();
        drop(inner);
        if ready.is_empty() {
            return;
        }
        for invocation in ready {
            invoke(&native, &invocation.callback, &invocation.args);
        }
    }
}

/// Converts a JS number to the value shape `ty` expects.
#[allow(clippy::cast_possible_truncation)]
fn value_for(ty: PrimitiveType, number: f64) -> Value {
    if ty.is_float() {
        Value::Float(number)
    } else {
        Value::Int(number as i64)
    }
}

/// JS-facing hook registration result.
#[derive(Serialize, Deserialize)]
pub struct WasmHookHandle {
    pub id: u32,
    pub host: u32,
}

/// Object whose properties are bound to main memory.
#[wasm_bindgen]
#[derive(Default)]
pub struct WasmBoundObject {
    inner: script_core::BoundObject,
}

#[wasm_bindgen]
impl WasmBoundObject {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound property names in binding order.
    pub fn names(&self) -> Vec<String> {
        self.inner.names().map(str::to_owned).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }
}

/// Reusable struct type returned by `WasmSession::typedef`.
#[wasm_bindgen]
pub struct WasmStructType {
    inner: StructType,
}

#[wasm_bindgen]
impl WasmStructType {
    pub fn sizeof(&self) -> u32 {
        self.inner.sizeof()
    }

    /// Byte offset of `name`, or `undefined`.
    pub fn offset_of(&self, name: &str) -> Option<u32> {
        self.inner.layout().offset_of(name)
    }

    /// New instance bound at `base`.
    pub fn at(&self, base: u32) -> WasmBoundObject {
        WasmBoundObject {
            inner: self.inner.at(base),
        }
    }
}

#[wasm_bindgen]
pub struct WasmSession {
    bridge: Rc<RefCell<Bridge>>,
    hex_digits: usize,
}

#[wasm_bindgen]
impl WasmSession {
    #[wasm_bindgen(constructor)]
    pub fn new(native: Native) -> Self {
        Self::open(native, SessionConfig::default())
    }

    /// Starts a session with a `SessionConfig`-shaped object.
    pub fn with_config(native: Native, config: JsValue) -> Result<WasmSession, JsValue> {
        let config: SessionConfig = serde_wasm_bindgen::from_value(config)?;
        console_log!("script session configured: {:?}", config);
        Ok(Self::open(native, config))
    }

    pub fn gpr_get(&self, index: u32) -> Result<u32, JsValue> {
        self.with_session(|s| s.gpr().get(index))
    }

    pub fn gpr_set(&self, index: u32, value: u32) -> Result<(), JsValue> {
        self.with_session(|s| s.gpr().set(index, value))
    }

    /// Reads a GPR by name (`sp`, `ra`, ... or `pc`).
    pub fn gpr_get_named(&self, name: &str) -> Result<u32, JsValue> {
        self.with_session(|s| s.gpr().get_named(name))
    }

    pub fn gpr_set_named(&self, name: &str, value: u32) -> Result<(), JsValue> {
        self.with_session(|s| s.gpr().set_named(name, value))
    }

    pub fn fpr_get(&self, index: u32) -> Result<f32, JsValue> {
        self.with_session(|s| s.fpr().get(index))
    }

    pub fn fpr_set(&self, index: u32, value: f32) -> Result<(), JsValue> {
        self.with_session(|s| s.fpr().set(index, value))
    }

    pub fn fpr_get_named(&self, name: &str) -> Result<f32, JsValue> {
        self.with_session(|s| s.fpr().get_named(name))
    }

    pub fn fpr_set_named(&self, name: &str, value: f32) -> Result<(), JsValue> {
        self.with_session(|s| s.fpr().set_named(name, value))
    }

    /// Typed main-memory read; `ty` is a type tag such as `"u16"`.
    pub fn mem_read(&self, ty: &str, address: u32) -> Result<f64, JsValue> {
        let ty = PrimitiveType::from_tag(ty).map_err(|e| to_js(&e))?;
        self.with_session(|s| s.mem().read(ty, address).map(Value::as_f64))
    }

    pub fn mem_write(&self, ty: &str, address: u32, value: f64) -> Result<(), JsValue> {
        let ty = PrimitiveType::from_tag(ty).map_err(|e| to_js(&e))?;
        self.with_session(|s| s.mem().write(ty, address, value_for(ty, value)))
    }

    pub fn mem_getblock(&self, address: u32, size: usize) -> Result<Vec<u8>, JsValue> {
        self.with_session(|s| s.mem().getblock(address, size))
    }

    pub fn mem_setblock(&self, address: u32, data: &[u8]) -> Result<(), JsValue> {
        self.with_session(|s| s.mem().setblock(address, data))
    }

    pub fn mem_getstring(&self, address: u32) -> Result<String, JsValue> {
        self.with_session(|s| s.mem().getstring(address))
    }

    pub fn mem_setstring(&self, address: u32, text: &str) -> Result<(), JsValue> {
        self.with_session(|s| s.mem().setstring(address, text))
    }

    pub fn rom_read(&self, ty: &str, address: u32) -> Result<f64, JsValue> {
        let ty = PrimitiveType::from_tag(ty).map_err(|e| to_js(&e))?;
        self.with_session(|s| s.rom().read(ty, address).map(Value::as_f64))
    }

    /// ROM accepts only float and double writes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn rom_write_float(&self, address: u32, value: f64, double: bool) -> Result<(), JsValue> {
        self.with_session(|s| {
            if double {
                s.rom().double().set(address, value)
            } else {
                s.rom().float().set(address, value as f32)
            }
        })
    }

    pub fn rom_getblock(&self, address: u32, size: usize) -> Result<Vec<u8>, JsValue> {
        self.with_session(|s| s.rom().getblock(address, size))
    }

    pub fn rom_getstring(&self, address: u32) -> Result<String, JsValue> {
        self.with_session(|s| s.rom().getstring(address))
    }

    /// Binds `name` on `target` to `ty` at `address`.
    #[allow(clippy::unused_self)]
    pub fn bindvar(
        &self,
        target: &mut WasmBoundObject,
        address: u32,
        name: &str,
        ty: &str,
    ) -> Result<(), JsValue> {
        let ty = PrimitiveType::from_tag(ty).map_err(|e| to_js(&e))?;
        script_core::bindvar(&mut target.inner, address, name, ty)
            .map(|_| ())
            .map_err(|e| to_js(&e))
    }

    /// Binds `[[address, name, type], ...]` onto `target`.
    #[allow(clippy::unused_self)]
    pub fn bindvars(&self, target: &mut WasmBoundObject, list: JsValue) -> Result<(), JsValue> {
        let list: Vec<(u32, String, PrimitiveType)> = serde_wasm_bindgen::from_value(list)?;
        let entries: Vec<(u32, &str, PrimitiveType)> = list
            .iter()
            .map(|(address, name, ty)| (*address, name.as_str(), *ty))
            .collect();
        script_core::bindvars(&mut target.inner, &entries)
            .map(|_| ())
            .map_err(|e| to_js(&e))
    }

    /// Binds `[{ name, type }, ...]` contiguously from `base`.
    #[allow(clippy::unused_self)]
    pub fn bindstruct(&self, target: &mut WasmBoundObject, base: u32, fields: JsValue) -> Result<(), JsValue> {
        let fields: Vec<FieldDescriptor> = serde_wasm_bindgen::from_value(fields)?;
        let layout = StructLayout::new(fields).map_err(|e| to_js(&e))?;
        script_core::bindstruct(&mut target.inner, base, &layout)
            .map(|_| ())
            .map_err(|e| to_js(&e))
    }

    pub fn bound_get(&self, target: &WasmBoundObject, name: &str) -> Result<f64, JsValue> {
        self.with_session(|s| target.inner.get(s.host_mut(), name).map(Value::as_f64))
    }

    pub fn bound_set(&self, target: &WasmBoundObject, name: &str, value: f64) -> Result<(), JsValue> {
        let binding = target
            .inner
            .binding(name)
            .ok_or_else(|| to_js(&ScriptError::UnknownField(name.to_owned())))?;
        self.with_session(|s| target.inner.set(s.host_mut(), name, value_for(binding.ty, value)))
    }

    /// Builds a struct type from `[{ name, type }, ...]`.
    #[allow(clippy::unused_self)]
    pub fn typedef(&self, fields: JsValue) -> Result<WasmStructType, JsValue> {
        let fields: Vec<FieldDescriptor> = serde_wasm_bindgen::from_value(fields)?;
        script_core::typedef(fields)
            .map(|inner| WasmStructType { inner })
            .map_err(|e| to_js(&e))
    }

    /// Reads field `name` of element `index` of a struct array at `base`.
    pub fn struct_get(
        &self,
        ty: &WasmStructType,
        base: u32,
        index: u32,
        name: &str,
    ) -> Result<f64, JsValue> {
        let object = ty.inner.element(base, index);
        self.with_session(|s| object.get(s.host_mut(), name).map(Value::as_f64))
    }

    pub fn struct_set(
        &self,
        ty: &WasmStructType,
        base: u32,
        index: u32,
        name: &str,
        value: f64,
    ) -> Result<(), JsValue> {
        let object = ty.inner.element(base, index);
        let binding = object
            .binding(name)
            .ok_or_else(|| to_js(&ScriptError::UnknownField(name.to_owned())))?;
        self.with_session(|s| object.set(s.host_mut(), name, value_for(binding.ty, value)))
    }

    /// Registers `callback` for `kind` (`"exec"`, `"read"` or `"write"`).
    ///
    /// Exceptions thrown by `callback` are printed to the script console.
    pub fn on(&self, kind: &str, tag: u32, callback: Function) -> Result<JsValue, JsValue> {
        let kind: HookKind = kind.parse().map_err(|e| to_js(&e))?;
        let handle = self.with_session(|s| {
            let native = s.host().native.clone();
            s.on(kind, tag, move |address| {
                invoke(&native, &callback, &[JsValue::from(address)]);
            })
        })?;
        let handle = WasmHookHandle {
            id: handle.id.0,
            host: handle.host.0,
        };
        Ok(serde_wasm_bindgen::to_value(&handle)?)
    }

    pub fn onexec(&self, address: u32, callback: Function) -> Result<JsValue, JsValue> {
        self.on(HookKind::Exec.as_str(), address, callback)
    }

    pub fn onread(&self, address: u32, callback: Function) -> Result<JsValue, JsValue> {
        self.on(HookKind::Read.as_str(), address, callback)
    }

    pub fn onwrite(&self, address: u32, callback: Function) -> Result<JsValue, JsValue> {
        self.on(HookKind::Write.as_str(), address, callback)
    }

    pub fn off(&self, id: u32) -> Result<(), JsValue> {
        self.with_session(|s| s.off(CallbackId(id)).map(|_| ()))
    }

    pub fn clear_hooks(&self) -> Result<(), JsValue> {
        self.with_session(ScriptSession::clear_hooks)
    }

    /// Formats `value`; omitting `digits` uses the session default.
    pub fn hex(&self, value: u32, digits: Option<usize>) -> String {
        hex_width(value, digits.unwrap_or(self.hex_digits))
    }

    /// `console.log` with a single pre-formatted argument.
    pub fn log(&self, text: &str) -> Result<(), JsValue> {
        self.with_session(|s| s.console().log(&[&text]))
    }

    pub fn print(&self, text: &str) -> Result<(), JsValue> {
        self.with_session(|s| s.console().print(text))
    }

    pub fn clear(&self) -> Result<(), JsValue> {
        self.with_session(|s| s.console().clear())
    }

    pub fn alert(&self, text: &str, caption: Option<String>) -> Result<(), JsValue> {
        self.with_session(|s| s.alert(text, caption.as_deref()))
    }

    pub fn pause(&self) -> Result<(), JsValue> {
        self.with_session(|s| s.system().pause())
    }

    pub fn resume(&self) -> Result<(), JsValue> {
        self.with_session(|s| s.system().resume())
    }

    pub fn reset(&self) -> Result<(), JsValue> {
        self.with_session(|s| s.system().reset())
    }

    pub fn hardreset(&self) -> Result<(), JsValue> {
        self.with_session(|s| s.system().hardreset())
    }

    pub fn savestate(&self) -> Result<(), JsValue> {
        self.with_session(|s| s.system().savestate())
    }

    pub fn loadstate(&self) -> Result<(), JsValue> {
        self.with_session(|s| s.system().loadstate())
    }

    pub fn saveslot(&self) -> Result<u32, JsValue> {
        self.with_session(|s| s.system().saveslot())
    }

    pub fn set_saveslot(&self, slot: u32) -> Result<(), JsValue> {
        self.with_session(|s| s.system().set_saveslot(slot))
    }

    pub fn generatebitmap(&self) -> Result<(), JsValue> {
        self.with_session(|s| s.system().generatebitmap())
    }

    pub fn showmemory(&self, address: u32) -> Result<(), JsValue> {
        self.with_session(|s| s.debug().showmemory(address))
    }

    pub fn showcommands(&self, address: u32) -> Result<(), JsValue> {
        self.with_session(|s| s.debug().showcommands(address))
    }

    /// Shows the disassembly at `pc` and pauses.
    pub fn breakhere(&self) -> Result<(), JsValue> {
        self.with_session(|s| s.debug().breakhere())
    }

    /// Creates a client socket and returns its descriptor.
    pub fn socket(&self) -> Result<u32, JsValue> {
        self.with_bridge(|bridge| {
            let socket = bridge.session.socket().map_err(|e| to_js(&e))?;
            let fd = socket.fd().0;
            bridge.sockets.insert(fd, socket);
            Ok(fd)
        })
    }

    /// Connects socket `fd`; missing parts use the session defaults.
    pub fn socket_connect(
        &self,
        fd: u32,
        host: Option<String>,
        port: Option<u16>,
        callback: Option<Function>,
    ) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let notify = callback.map(|callback| bridge.deferred(callback));
            let (session, socket) = bridge.socket(fd)?;
            let options = ConnectOptions {
                host: host.as_deref(),
                port,
            };
            socket
                .connect(session.host_mut(), options, move || {
                    if let Some(notify) = &notify {
                        notify(Vec::new());
                    }
                })
                .map_err(|e| to_js(&e))
        })
    }

    /// Installs the data handler of socket `fd` and starts reading.
    pub fn socket_on_data(&self, fd: u32, callback: Function) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let notify = bridge.deferred(callback);
            let (session, socket) = bridge.socket(fd)?;
            socket
                .on_data(session.host_mut(), move |data| {
                    notify(vec![Uint8Array::from(data).into()]);
                })
                .map_err(|e| to_js(&e))
        })
    }

    pub fn socket_on_close(&self, fd: u32, callback: Function) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let notify = bridge.deferred(callback);
            let (_, socket) = bridge.socket(fd)?;
            socket.on_close(move || notify(Vec::new()));
            Ok(())
        })
    }

    /// Sends `data`; `callback` runs once the host has written it.
    pub fn socket_write(&self, fd: u32, data: &[u8], callback: Option<Function>) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let on_written = callback.map(|callback| {
                let notify = bridge.deferred(callback);
                Box::new(move || notify(Vec::new())) as EventHandler
            });
            let (session, socket) = bridge.socket(fd)?;
            socket
                .write(session.host_mut(), data, on_written)
                .map_err(|e| to_js(&e))
        })
    }

    pub fn socket_close(&self, fd: u32) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let (session, socket) = bridge.socket(fd)?;
            socket.close(session.host_mut()).map_err(|e| to_js(&e))
        })
    }

    /// Creates a server, listening on `port` when given, and returns its
    /// descriptor.
    pub fn server(&self, port: Option<u16>) -> Result<u32, JsValue> {
        self.with_bridge(|bridge| {
            let server = bridge.session.server(port).map_err(|e| to_js(&e))?;
            let fd = server.fd().0;
            bridge.servers.insert(fd, server);
            Ok(fd)
        })
    }

    pub fn server_listen(&self, fd: u32, port: u16) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let (session, server) = bridge.server(fd)?;
            server.listen(session.host_mut(), port).map_err(|e| to_js(&e))
        })
    }

    /// Installs the connection handler; it receives each client's socket
    /// descriptor.
    pub fn server_on_connection(&self, fd: u32, callback: Function) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let notify = bridge.deferred(callback);
            let adopted = Rc::clone(&bridge.adopted);
            let (session, server) = bridge.server(fd)?;
            server
                .on_connection(session.host_mut(), move |socket: Socket| {
                    let client = socket.fd().0;
                    adopted.borrow_mut().push(socket);
                    notify(vec![JsValue::from(client)]);
                })
                .map_err(|e| to_js(&e))
        })
    }

    /// Starts `callback` on a host thread and returns a thread key.
    pub fn spawn(&self, callback: Function) -> Result<u32, JsValue> {
        self.with_bridge(|bridge| {
            let key = bridge.next_thread;
            bridge.next_thread += 1;
            let native = bridge.session.host().native.clone();
            THREAD_PROCS.with(|procs| procs.borrow_mut().insert(key, (callback, native)));
            match bridge.session.spawn(move || run_thread_proc(key)) {
                Ok(thread) => {
                    bridge.threads.insert(key, thread);
                    Ok(key)
                }
                Err(err) => {
                    THREAD_PROCS.with(|procs| procs.borrow_mut().remove(&key));
                    Err(to_js(&err))
                }
            }
        })
    }

    /// Numeric state of thread `key` (`0` ready .. `3` stopped).
    pub fn thread_state(&self, key: u32) -> Result<u8, JsValue> {
        self.with_bridge(|bridge| bridge.thread(key).map(|(_, thread)| thread.state().code()))
    }

    pub fn thread_suspend(&self, key: u32) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let (session, thread) = bridge.thread(key)?;
            thread.suspend(session.host_mut()).map_err(|e| to_js(&e))
        })
    }

    pub fn thread_resume(&self, key: u32) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let (session, thread) = bridge.thread(key)?;
            thread.resume(session.host_mut()).map_err(|e| to_js(&e))
        })
    }

    pub fn thread_stop(&self, key: u32) -> Result<(), JsValue> {
        self.with_bridge(|bridge| {
            let (session, thread) = bridge.thread(key)?;
            thread.stop(session.host_mut()).map_err(|e| to_js(&e))?;
            THREAD_PROCS.with(|procs| procs.borrow_mut().remove(&key));
            Ok(())
        })
    }

    pub fn sleep(&self, ms: u32) -> Result<(), JsValue> {
        self.with_session(|s| s.sleep(ms))
    }
}

impl WasmSession {
    fn open(native: Native, config: SessionConfig) -> Self {
        console_error_panic_hook::set_once();
        let hex_digits = config.hex_digits;
        let bridge = Rc::new_cyclic(|link| {
            let mut host = JsHost::new(native);
            host.bridge = link.clone();
            RefCell::new(Bridge {
                session: ScriptSession::with_config(host, config),
                sockets: HashMap::new(),
                servers: HashMap::new(),
                threads: HashMap::new(),
                next_thread: 0,
                ready: Rc::default(),
                adopted: Rc::default(),
            })
        });
        Self { bridge, hex_digits }
    }

    /// Runs `f` on the bridge, then delivers any completions it produced.
    fn with_bridge<T>(&self, f: impl FnOnce(&mut Bridge) -> Result<T, JsValue>) -> Result<T, JsValue> {
        let result = {
            let mut bridge = self.bridge.try_borrow_mut().map_err(|_| busy())?;
            f(&mut bridge)
        };
        pump(&self.bridge);
        result
    }

    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut ScriptSession<JsHost>) -> Result<T, ScriptError>,
    ) -> Result<T, JsValue> {
        self.with_bridge(|bridge| f(&mut bridge.session).map_err(|e| to_js(&e)))
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use js_sys::{Array, Function, Reflect};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::{Native, WasmSession};

    /// JS `_native` stand-in that records console output and keeps every
    /// callback it is handed.
    fn fake_native() -> JsValue {
        Function::new_no_args(
            r"return {
                printed: [], calls: [], hooks: {}, pending: [], nextHook: 0, nextFd: 0,
                consolePrint(text) { this.printed.push(text); },
                addCallback(kind, callback, tag) { this.nextHook += 1; this.hooks[this.nextHook] = callback; return this.nextHook; },
                removeCallback(id) { delete this.hooks[id]; },
                getPCVal() { return 0x80246DD8; },
                pause() { this.calls.push('pause'); },
                showCommands(address) { this.calls.push('showCommands:' + address); },
                sockCreate() { this.nextFd += 1; return this.nextFd; },
                read(fd, size, callback) { this.pending.push(callback); },
                write(fd, data, callback) { this.pending.push(callback); },
            };",
        )
        .call0(&JsValue::NULL)
        .unwrap()
    }

    fn field(object: &JsValue, name: &str) -> JsValue {
        Reflect::get(object, &JsValue::from_str(name)).unwrap()
    }

    fn printed(native: &JsValue) -> Vec<String> {
        field(native, "printed")
            .unchecked_into::<Array>()
            .iter()
            .filter_map(|line| line.as_string())
            .collect()
    }

    #[wasm_bindgen_test]
    fn hex_formats_like_the_core() {
        assert_eq!(script_core::hex(0xBEEF_u32), "0000BEEF");
    }

    #[wasm_bindgen_test]
    fn throwing_hook_reports_to_the_script_console() {
        let native = fake_native();
        let session = WasmSession::new(native.clone().unchecked_into::<Native>());

        session
            .onexec(0x8024_6DD8, Function::new_no_args("throw new Error('boom')"))
            .unwrap();
        let hook: Function = field(&field(&native, "hooks"), "1").unchecked_into();
        hook.call1(&JsValue::NULL, &JsValue::from(0x8024_6DD8_u32)).unwrap();

        assert_eq!(printed(&native), vec!["error: boom\r\n".to_owned()]);
    }

    #[wasm_bindgen_test]
    fn breakhere_shows_commands_then_pauses() {
        let native = fake_native();
        let session = WasmSession::new(native.clone().unchecked_into::<Native>());

        session.breakhere().unwrap();

        let calls: Vec<String> = field(&native, "calls")
            .unchecked_into::<Array>()
            .iter()
            .filter_map(|call| call.as_string())
            .collect();
        assert_eq!(calls, vec![format!("showCommands:{}", 0x8024_6DD8_u32), "pause".to_owned()]);
    }

    #[wasm_bindgen_test]
    fn socket_write_completion_reaches_the_script() {
        let native = fake_native();
        let session = WasmSession::new(native.clone().unchecked_into::<Native>());
        let fd = session.socket().unwrap();

        session
            .socket_write(fd, b"ping", Some(Function::new_no_args("throw new Error('sent')")))
            .unwrap();
        let done: Function = field(&native, "pending").unchecked_into::<Array>().get(0).unchecked_into();
        done.call0(&JsValue::NULL).unwrap();

        assert_eq!(printed(&native), vec!["error: sent\r\n".to_owned()]);
    }
}

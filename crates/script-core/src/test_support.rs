//! In-memory big-endian host used by unit tests.

use std::collections::HashMap;

use crate::{
    ConsoleHost, DebugHost, DialogHost, HookCallback, HookHost, HookKind, HostError, HostHookId,
    MemoryHost, MemorySpace, RegisterHost, SocketFd, SocketHost, SystemHost, ThreadHandle,
    ThreadHost, ThreadProc,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    ReadInt {
        space: MemorySpace,
        address: u32,
        bits: u32,
        signed: bool,
    },
    WriteInt {
        space: MemorySpace,
        address: u32,
        bits: u32,
        value: i64,
    },
    ReadFloat {
        space: MemorySpace,
        address: u32,
        double: bool,
    },
    WriteFloat {
        space: MemorySpace,
        address: u32,
        double: bool,
    },
    Block(MemorySpace, u32),
    Str(MemorySpace, u32),
    AddCallback(HookKind, u32),
    RemoveCallback(HostHookId),
    Print(String),
    ClearConsole,
    MessageBox(String, String),
    System(&'static str),
    ShowCommands(u32),
    ShowMemory(u32),
    Socket(&'static str, SocketFd),
    SocketArgs(String),
    Thread(&'static str),
}

#[derive(Default)]
pub(crate) struct FakeHost {
    main: HashMap<u32, u8>,
    rom: HashMap<u32, u8>,
    pub(crate) gpr: [u32; 32],
    pub(crate) fpr: [f32; 32],
    pub(crate) pc: u32,
    pub(crate) hooks: HashMap<HostHookId, (HookKind, u32, HookCallback)>,
    next_hook: u32,
    next_fd: u32,
    next_thread: u64,
    pub(crate) save_slot: u32,
    pub(crate) calls: Vec<Call>,
    fail_on: Option<&'static str>,
}

impl FakeHost {
    pub(crate) fn failing(call: &'static str) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub(crate) fn set_failure(&mut self, call: Option<&'static str>) {
        self.fail_on = call;
    }

    fn check(&self, call: &'static str) -> Result<(), HostError> {
        if self.fail_on == Some(call) {
            Err(HostError::new(call, "injected failure"))
        } else {
            Ok(())
        }
    }

    fn bank(&mut self, space: MemorySpace) -> &mut HashMap<u32, u8> {
        match space {
            MemorySpace::Main => &mut self.main,
            MemorySpace::Rom => &mut self.rom,
        }
    }

    pub(crate) fn poke(&mut self, space: MemorySpace, address: u32, bytes: &[u8]) {
        let bank = self.bank(space);
        for (offset, byte) in (0_u32..).zip(bytes) {
            bank.insert(address.wrapping_add(offset), *byte);
        }
    }

    pub(crate) fn peek(&mut self, space: MemorySpace, address: u32, len: u32) -> Vec<u8> {
        let bank = self.bank(space);
        (0..len)
            .map(|offset| bank.get(&address.wrapping_add(offset)).copied().unwrap_or(0))
            .collect()
    }
}

const fn name(space: MemorySpace, main: &'static str, rom: &'static str) -> &'static str {
    match space {
        MemorySpace::Main => main,
        MemorySpace::Rom => rom,
    }
}

impl RegisterHost for FakeHost {
    fn gpr(&mut self, index: u32) -> Result<u32, HostError> {
        self.check("getGPRVal")?;
        Ok(self.gpr[index as usize])
    }

    fn set_gpr(&mut self, index: u32, value: u32) -> Result<(), HostError> {
        self.check("setGPRVal")?;
        self.gpr[index as usize] = value;
        Ok(())
    }

    fn fpr(&mut self, index: u32) -> Result<f32, HostError> {
        self.check("getFPRVal")?;
        Ok(self.fpr[index as usize])
    }

    fn set_fpr(&mut self, index: u32, value: f32) -> Result<(), HostError> {
        self.check("setFPRVal")?;
        self.fpr[index as usize] = value;
        Ok(())
    }

    fn pc(&mut self) -> Result<u32, HostError> {
        self.check("getPCVal")?;
        Ok(self.pc)
    }

    fn set_pc(&mut self, value: u32) -> Result<(), HostError> {
        self.check("setPCVal")?;
        self.pc = value;
        Ok(())
    }
}

impl MemoryHost for FakeHost {
    fn read_int(
        &mut self,
        space: MemorySpace,
        address: u32,
        bits: u32,
        signed: bool,
    ) -> Result<i64, HostError> {
        self.calls.push(Call::ReadInt {
            space,
            address,
            bits,
            signed,
        });
        self.check(name(space, "getRDRAMInt", "getROMInt"))?;
        let raw = self
            .peek(space, address, bits / 8)
            .into_iter()
            .fold(0_u64, |acc, byte| (acc << 8) | u64::from(byte));
        let shift = 64 - bits;
        let value = if signed {
            ((raw << shift) as i64) >> shift
        } else {
            raw as i64
        };
        Ok(value)
    }

    fn write_int(
        &mut self,
        space: MemorySpace,
        address: u32,
        bits: u32,
        value: i64,
    ) -> Result<(), HostError> {
        self.calls.push(Call::WriteInt {
            space,
            address,
            bits,
            value,
        });
        self.check(name(space, "setRDRAMInt", "setROMInt"))?;
        let bytes = value.to_be_bytes();
        let len = (bits / 8) as usize;
        self.poke(space, address, &bytes[8 - len..]);
        Ok(())
    }

    fn read_float(
        &mut self,
        space: MemorySpace,
        address: u32,
        double: bool,
    ) -> Result<f64, HostError> {
        self.calls.push(Call::ReadFloat {
            space,
            address,
            double,
        });
        self.check(name(space, "getRDRAMFloat", "getROMFloat"))?;
        if double {
            let bytes: [u8; 8] = self.peek(space, address, 8).try_into().unwrap();
            Ok(f64::from_be_bytes(bytes))
        } else {
            let bytes: [u8; 4] = self.peek(space, address, 4).try_into().unwrap();
            Ok(f64::from(f32::from_be_bytes(bytes)))
        }
    }

    fn write_float(
        &mut self,
        space: MemorySpace,
        address: u32,
        value: f64,
        double: bool,
    ) -> Result<(), HostError> {
        self.calls.push(Call::WriteFloat {
            space,
            address,
            double,
        });
        self.check(name(space, "setRDRAMFloat", "setROMFloat"))?;
        if double {
            self.poke(space, address, &value.to_be_bytes());
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let single = value as f32;
            self.poke(space, address, &single.to_be_bytes());
        }
        Ok(())
    }

    fn read_block(
        &mut self,
        space: MemorySpace,
        address: u32,
        size: usize,
    ) -> Result<Vec<u8>, HostError> {
        self.calls.push(Call::Block(space, address));
        self.check(name(space, "getRDRAMBlock", "getROMBlock"))?;
        Ok(self.peek(space, address, u32::try_from(size).unwrap()))
    }

    fn write_block(
        &mut self,
        space: MemorySpace,
        address: u32,
        data: &[u8],
    ) -> Result<(), HostError> {
        self.calls.push(Call::Block(space, address));
        self.check("setRDRAMBlock")?;
        self.poke(space, address, data);
        Ok(())
    }

    fn read_string(&mut self, space: MemorySpace, address: u32) -> Result<String, HostError> {
        self.calls.push(Call::Str(space, address));
        self.check(name(space, "getRDRAMString", "getROMString"))?;
        let bank = self.bank(space);
        let bytes: Vec<u8> = (0_u32..)
            .map(|offset| bank.get(&address.wrapping_add(offset)).copied().unwrap_or(0))
            .take_while(|byte| *byte != 0)
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn write_string(
        &mut self,
        space: MemorySpace,
        address: u32,
        text: &str,
    ) -> Result<(), HostError> {
        self.calls.push(Call::Str(space, address));
        self.check("setRDRAMString")?;
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        self.poke(space, address, &bytes);
        Ok(())
    }
}

impl HookHost for FakeHost {
    fn add_callback(
        &mut self,
        kind: HookKind,
        tag: u32,
        callback: HookCallback,
    ) -> Result<HostHookId, HostError> {
        self.calls.push(Call::AddCallback(kind, tag));
        self.check("addCallback")?;
        let id = HostHookId(self.next_hook + 100);
        self.next_hook += 1;
        self.hooks.insert(id, (kind, tag, callback));
        Ok(id)
    }

    fn remove_callback(&mut self, id: HostHookId) -> Result<(), HostError> {
        self.calls.push(Call::RemoveCallback(id));
        self.check("removeCallback")?;
        self.hooks.remove(&id);
        Ok(())
    }
}

impl ConsoleHost for FakeHost {
    fn print(&mut self, text: &str) -> Result<(), HostError> {
        self.check("consolePrint")?;
        self.calls.push(Call::Print(text.to_owned()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HostError> {
        self.check("consoleClear")?;
        self.calls.push(Call::ClearConsole);
        Ok(())
    }
}

impl DialogHost for FakeHost {
    fn message_box(&mut self, text: &str, caption: &str) -> Result<(), HostError> {
        self.check("msgBox")?;
        self.calls
            .push(Call::MessageBox(text.to_owned(), caption.to_owned()));
        Ok(())
    }
}

impl FakeHost {
    fn system(&mut self, call: &'static str) -> Result<(), HostError> {
        self.check(call)?;
        self.calls.push(Call::System(call));
        Ok(())
    }
}

impl SystemHost for FakeHost {
    fn pause(&mut self) -> Result<(), HostError> {
        self.system("pause")
    }

    fn resume(&mut self) -> Result<(), HostError> {
        self.system("resume")
    }

    fn reset(&mut self) -> Result<(), HostError> {
        self.system("reset")
    }

    fn hard_reset(&mut self) -> Result<(), HostError> {
        self.system("hardReset")
    }

    fn save_state(&mut self) -> Result<(), HostError> {
        self.system("saveState")
    }

    fn load_state(&mut self) -> Result<(), HostError> {
        self.system("loadState")
    }

    fn set_save_slot(&mut self, slot: u32) -> Result<(), HostError> {
        self.system("setSaveSlot")?;
        self.save_slot = slot;
        Ok(())
    }

    fn save_slot(&mut self) -> Result<u32, HostError> {
        self.system("getSaveSlot")?;
        Ok(self.save_slot)
    }

    fn generate_bitmap(&mut self) -> Result<(), HostError> {
        self.system("generateBitmap")
    }
}

impl DebugHost for FakeHost {
    fn show_memory(&mut self, address: u32) -> Result<(), HostError> {
        self.check("showMemory")?;
        self.calls.push(Call::ShowMemory(address));
        Ok(())
    }

    fn show_commands(&mut self, address: u32) -> Result<(), HostError> {
        self.check("showCommands")?;
        self.calls.push(Call::ShowCommands(address));
        Ok(())
    }
}

impl SocketHost for FakeHost {
    fn create(&mut self) -> Result<SocketFd, HostError> {
        self.check("sockCreate")?;
        self.next_fd += 1;
        let fd = SocketFd(self.next_fd);
        self.calls.push(Call::Socket("create", fd));
        Ok(fd)
    }

    fn connect(&mut self, fd: SocketFd, host: &str, port: u16) -> Result<(), HostError> {
        self.check("sockConnect")?;
        self.calls.push(Call::Socket("connect", fd));
        self.calls.push(Call::SocketArgs(format!("{host}:{port}")));
        Ok(())
    }

    fn listen(&mut self, fd: SocketFd, port: u16) -> Result<(), HostError> {
        self.check("sockListen")?;
        self.calls.push(Call::Socket("listen", fd));
        self.calls.push(Call::SocketArgs(port.to_string()));
        Ok(())
    }

    fn accept(&mut self, fd: SocketFd) -> Result<(), HostError> {
        self.check("sockAccept")?;
        self.calls.push(Call::Socket("accept", fd));
        Ok(())
    }

    fn read(&mut self, fd: SocketFd, size: usize) -> Result<(), HostError> {
        self.check("read")?;
        self.calls.push(Call::Socket("read", fd));
        self.calls.push(Call::SocketArgs(size.to_string()));
        Ok(())
    }

    fn write(&mut self, fd: SocketFd, data: &[u8]) -> Result<(), HostError> {
        self.check("write")?;
        self.calls.push(Call::Socket("write", fd));
        self.calls
            .push(Call::SocketArgs(String::from_utf8_lossy(data).into_owned()));
        Ok(())
    }

    fn close(&mut self, fd: SocketFd) -> Result<(), HostError> {
        self.check("close")?;
        self.calls.push(Call::Socket("close", fd));
        Ok(())
    }
}

impl ThreadHost for FakeHost {
    fn create_thread(&mut self, proc: ThreadProc) -> Result<ThreadHandle, HostError> {
        self.check("createThread")?;
        self.calls.push(Call::Thread("create"));
        proc();
        self.next_thread += 1;
        Ok(ThreadHandle(self.next_thread))
    }

    fn suspend_thread(&mut self, _handle: ThreadHandle) -> Result<(), HostError> {
        self.check("suspendThread")?;
        self.calls.push(Call::Thread("suspend"));
        Ok(())
    }

    fn resume_thread(&mut self, _handle: ThreadHandle) -> Result<(), HostError> {
        self.check("resumeThread")?;
        self.calls.push(Call::Thread("resume"));
        Ok(())
    }

    fn terminate_thread(&mut self, _handle: ThreadHandle) -> Result<(), HostError> {
        self.check("terminateThread")?;
        self.calls.push(Call::Thread("terminate"));
        Ok(())
    }

    fn sleep(&mut self, _ms: u32) -> Result<(), HostError> {
        self.check("sleep")?;
        self.calls.push(Call::Thread("sleep"));
        Ok(())
    }
}

//! Walks an array of actor structs in a toy RAM image and prints each one,
//! the way a script would with `typedef` and `hex`.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use std::collections::HashMap;

use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use script_core::{
    hex, typedef, ConsoleHost, FieldDescriptor, HookCallback, HookHost, HookKind, HostError,
    HostHookId, MemoryHost, MemorySpace, PrimitiveType, RegisterHost, ScriptSession,
};

const ACTORS: u32 = 0x8033_D000;

#[derive(Default)]
struct ToyHost {
    ram: HashMap<u32, u8>,
    hooks: u32,
}

impl ToyHost {
    fn byte(&self, address: u32) -> u8 {
        self.ram.get(&address).copied().unwrap_or(0)
    }
}

impl RegisterHost for ToyHost {
    fn gpr(&mut self, _index: u32) -> Result<u32, HostError> {
        Ok(0)
    }

    fn set_gpr(&mut self, _index: u32, _value: u32) -> Result<(), HostError> {
        Ok(())
    }

    fn fpr(&mut self, _index: u32) -> Result<f32, HostError> {
        Ok(0.0)
    }

    fn set_fpr(&mut self, _index: u32, _value: f32) -> Result<(), HostError> {
        Ok(())
    }

    fn pc(&mut self) -> Result<u32, HostError> {
        Ok(0x8024_6DD8)
    }

    fn set_pc(&mut self, _value: u32) -> Result<(), HostError> {
        Ok(())
    }
}

impl MemoryHost for ToyHost {
    fn read_int(
        &mut self,
        _space: MemorySpace,
        address: u32,
        bits: u32,
        signed: bool,
    ) -> Result<i64, HostError> {
        let raw = (0..bits / 8).fold(0_u64, |acc, i| (acc << 8) | u64::from(self.byte(address + i)));
        let shift = 64 - bits;
        Ok(if signed {
            ((raw << shift) as i64) >> shift
        } else {
            raw as i64
        })
    }

    fn write_int(
        &mut self,
        _space: MemorySpace,
        address: u32,
        bits: u32,
        value: i64,
    ) -> Result<(), HostError> {
        let bytes = value.to_be_bytes();
        for (i, byte) in (0_u32..).zip(&bytes[8 - (bits / 8) as usize..]) {
            self.ram.insert(address + i, *byte);
        }
        Ok(())
    }

    fn read_float(&mut self, _space: MemorySpace, address: u32, double: bool) -> Result<f64, HostError> {
        if double {
            return Err(HostError::new("getRDRAMFloat", "doubles are not mapped"));
        }
        let bits = (0..4).fold(0_u32, |acc, i| (acc << 8) | u32::from(self.byte(address + i)));
        Ok(f64::from(f32::from_bits(bits)))
    }

    fn write_float(
        &mut self,
        _space: MemorySpace,
        address: u32,
        value: f64,
        _double: bool,
    ) -> Result<(), HostError> {
        for (i, byte) in (0_u32..).zip((value as f32).to_be_bytes()) {
            self.ram.insert(address + i, byte);
        }
        Ok(())
    }

    fn read_block(&mut self, _space: MemorySpace, address: u32, size: usize) -> Result<Vec<u8>, HostError> {
        Ok((0..size as u32).map(|i| self.byte(address + i)).collect())
    }

    fn write_block(&mut self, _space: MemorySpace, address: u32, data: &[u8]) -> Result<(), HostError> {
        for (i, byte) in (0_u32..).zip(data) {
            self.ram.insert(address + i, *byte);
        }
        Ok(())
    }

    fn read_string(&mut self, _space: MemorySpace, _address: u32) -> Result<String, HostError> {
        Ok(String::new())
    }

    fn write_string(&mut self, _space: MemorySpace, _address: u32, _text: &str) -> Result<(), HostError> {
        Ok(())
    }
}

impl HookHost for ToyHost {
    fn add_callback(
        &mut self,
        _kind: HookKind,
        _tag: u32,
        _callback: HookCallback,
    ) -> Result<HostHookId, HostError> {
        self.hooks += 1;
        Ok(HostHookId(self.hooks))
    }

    fn remove_callback(&mut self, _id: HostHookId) -> Result<(), HostError> {
        Ok(())
    }
}

impl ConsoleHost for ToyHost {
    fn print(&mut self, text: &str) -> Result<(), HostError> {
        print!("{text}");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}

fn main() {
    let mut session = ScriptSession::new(ToyHost::default());

    let actor = match typedef([
        FieldDescriptor::new("id", PrimitiveType::U16),
        FieldDescriptor::new("hp", PrimitiveType::S16),
        FieldDescriptor::new("x", PrimitiveType::Float),
    ]) {
        Ok(actor) => actor,
        Err(err) => {
            eprintln!("typedef failed: {err}");
            return;
        }
    };

    session.run(|s| {
        for index in 0..4_u32 {
            let obj = actor.element(ACTORS, index);
            obj.set(s.host_mut(), "id", 0x0100 + index)?;
            obj.set(s.host_mut(), "hp", 10_i32 - 7 * index as i32)?;
            obj.set(s.host_mut(), "x", 1.5_f32 * index as f32)?;
        }
        Ok(())
    });

    session.run(|s| {
        for index in 0..4_u32 {
            let obj = actor.element(ACTORS, index);
            let id = obj.get(s.host_mut(), "id")?;
            let hp = obj.get(s.host_mut(), "hp")?;
            let x = obj.get(s.host_mut(), "x")?;
            let address = hex(ACTORS + index * actor.sizeof());
            s.console().log(&[&address, &id, &hp, &x])?;
        }
        Ok(())
    });

    session.run(|s| s.mem().double().get(ACTORS));
}

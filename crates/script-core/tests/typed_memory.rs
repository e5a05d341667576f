//! Typed main-memory and ROM access through a big-endian RAM-backed host.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

use log as _;
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use script_core::{
    ConsoleHost, HookCallback, HookHost, HookKind, HostError, HostHookId, MemoryHost, MemorySpace,
    PrimitiveType, RegisterHost, Scalar, ScriptSession, Value,
};

const RAM_BASE: u32 = 0x8000_0000;
const RAM_SIZE: usize = 0x1_0000;

struct RamHost {
    ram: Vec<u8>,
    rom: Vec<u8>,
    gpr: [u32; 32],
    pc: u32,
    console: String,
}

impl Default for RamHost {
    fn default() -> Self {
        Self {
            ram: vec![0; RAM_SIZE],
            rom: vec![0; RAM_SIZE],
            gpr: [0; 32],
            pc: 0,
            console: String::new(),
        }
    }
}

impl RamHost {
    fn bank(&mut self, space: MemorySpace) -> &mut Vec<u8> {
        match space {
            MemorySpace::Main => &mut self.ram,
            MemorySpace::Rom => &mut self.rom,
        }
    }

    fn offset(address: u32) -> Result<usize, HostError> {
        let offset = address.wrapping_sub(RAM_BASE) as usize;
        if offset < RAM_SIZE {
            Ok(offset)
        } else {
            Err(HostError::new("memory", format!("address {address:#010X} is unmapped")))
        }
    }

    fn bytes(&mut self, space: MemorySpace, address: u32, len: usize) -> Result<Vec<u8>, HostError> {
        let start = Self::offset(address)?;
        let bank = self.bank(space);
        bank.get(start..start + len)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| HostError::new("memory", "access runs past the end of memory"))
    }

    fn store(&mut self, space: MemorySpace, address: u32, data: &[u8]) -> Result<(), HostError> {
        let start = Self::offset(address)?;
        let bank = self.bank(space);
        let slot = bank
            .get_mut(start..start + data.len())
            .ok_or_else(|| HostError::new("memory", "access runs past the end of memory"))?;
        slot.copy_from_slice(data);
        Ok(())
    }
}

impl RegisterHost for RamHost {
    fn gpr(&mut self, index: u32) -> Result<u32, HostError> {
        Ok(self.gpr[index as usize])
    }

    fn set_gpr(&mut self, index: u32, value: u32) -> Result<(), HostError> {
        self.gpr[index as usize] = value;
        Ok(())
    }

    fn fpr(&mut self, _index: u32) -> Result<f32, HostError> {
        Ok(0.0)
    }

    fn set_fpr(&mut self, _index: u32, _value: f32) -> Result<(), HostError> {
        Ok(())
    }

    fn pc(&mut self) -> Result<u32, HostError> {
        Ok(self.pc)
    }

    fn set_pc(&mut self, value: u32) -> Result<(), HostError> {
        self.pc = value;
        Ok(())
    }
}

impl MemoryHost for RamHost {
    fn read_int(
        &mut self,
        space: MemorySpace,
        address: u32,
        bits: u32,
        signed: bool,
    ) -> Result<i64, HostError> {
        let raw = self
            .bytes(space, address, (bits / 8) as usize)?
            .into_iter()
            .fold(0_u64, |acc, byte| (acc << 8) | u64::from(byte));
        let shift = 64 - bits;
        Ok(if signed {
            ((raw << shift) as i64) >> shift
        } else {
            raw as i64
        })
    }

    fn write_int(
        &mut self,
        space: MemorySpace,
        address: u32,
        bits: u32,
        value: i64,
    ) -> Result<(), HostError> {
        let bytes = value.to_be_bytes();
        self.store(space, address, &bytes[8 - (bits / 8) as usize..])
    }

    fn read_float(&mut self, space: MemorySpace, address: u32, double: bool) -> Result<f64, HostError> {
        if double {
            let bytes = self.bytes(space, address, 8)?;
            Ok(f64::from_be_bytes(bytes.try_into().unwrap()))
        } else {
            let bytes = self.bytes(space, address, 4)?;
            Ok(f64::from(f32::from_be_bytes(bytes.try_into().unwrap())))
        }
    }

    fn write_float(
        &mut self,
        space: MemorySpace,
        address: u32,
        value: f64,
        double: bool,
    ) -> Result<(), HostError> {
        if double {
            self.store(space, address, &value.to_be_bytes())
        } else {
            self.store(space, address, &(value as f32).to_be_bytes())
        }
    }

    fn read_block(&mut self, space: MemorySpace, address: u32, size: usize) -> Result<Vec<u8>, HostError> {
        self.bytes(space, address, size)
    }

    fn write_block(&mut self, space: MemorySpace, address: u32, data: &[u8]) -> Result<(), HostError> {
        self.store(space, address, data)
    }

    fn read_string(&mut self, space: MemorySpace, address: u32) -> Result<String, HostError> {
        let start = Self::offset(address)?;
        let bank = self.bank(space);
        let text: Vec<u8> = bank[start..].iter().copied().take_while(|b| *b != 0).collect();
        Ok(String::from_utf8_lossy(&text).into_owned())
    }

    fn write_string(&mut self, space: MemorySpace, address: u32, text: &str) -> Result<(), HostError> {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        self.store(space, address, &bytes)
    }
}

impl HookHost for RamHost {
    fn add_callback(
        &mut self,
        _kind: HookKind,
        _tag: u32,
        _callback: HookCallback,
    ) -> Result<HostHookId, HostError> {
        Ok(HostHookId(0))
    }

    fn remove_callback(&mut self, _id: HostHookId) -> Result<(), HostError> {
        Ok(())
    }
}

impl ConsoleHost for RamHost {
    fn print(&mut self, text: &str) -> Result<(), HostError> {
        self.console.push_str(text);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HostError> {
        self.console.clear();
        Ok(())
    }
}

fn ram_address() -> impl Strategy<Value = u32> {
    (0..(RAM_SIZE as u32 - 8)).prop_map(|offset| RAM_BASE + offset)
}

fn round_trip<T: Scalar>(address: u32, value: T) -> T {
    let mut session = ScriptSession::new(RamHost::default());
    session.mem().typed::<T>().set(address, value).unwrap();
    session.mem().typed::<T>().get(address).unwrap()
}

proptest! {
    #[test]
    fn u8_round_trips(address in ram_address(), value in any::<u8>()) {
        prop_assert_eq!(round_trip(address, value), value);
    }

    #[test]
    fn u16_round_trips(address in ram_address(), value in any::<u16>()) {
        prop_assert_eq!(round_trip(address, value), value);
    }

    #[test]
    fn u32_round_trips(address in ram_address(), value in any::<u32>()) {
        prop_assert_eq!(round_trip(address, value), value);
    }

    #[test]
    fn s8_round_trips(address in ram_address(), value in any::<i8>()) {
        prop_assert_eq!(round_trip(address, value), value);
    }

    #[test]
    fn s16_round_trips(address in ram_address(), value in any::<i16>()) {
        prop_assert_eq!(round_trip(address, value), value);
    }

    #[test]
    fn s32_round_trips(address in ram_address(), value in any::<i32>()) {
        prop_assert_eq!(round_trip(address, value), value);
    }

    #[test]
    fn float_round_trips(address in ram_address(), value in any::<f32>().prop_filter("nan", |v| !v.is_nan())) {
        prop_assert_eq!(round_trip(address, value), value);
    }

    #[test]
    fn double_round_trips(address in ram_address(), value in any::<f64>().prop_filter("nan", |v| !v.is_nan())) {
        prop_assert_eq!(round_trip(address, value), value);
    }
}

#[rstest]
#[case(PrimitiveType::U8, &[0xFF], Value::Int(255))]
#[case(PrimitiveType::S8, &[0xFF], Value::Int(-1))]
#[case(PrimitiveType::U16, &[0x80, 0x00], Value::Int(0x8000))]
#[case(PrimitiveType::S16, &[0x80, 0x00], Value::Int(-0x8000))]
#[case(PrimitiveType::U32, &[0xDE, 0xAD, 0xBE, 0xEF], Value::Int(0xDEAD_BEEF))]
#[case(PrimitiveType::S32, &[0xFF, 0xFF, 0xFF, 0xFE], Value::Int(-2))]
#[case(PrimitiveType::Float, &[0x3F, 0xC0, 0x00, 0x00], Value::Float(1.5))]
fn dynamic_reads_decode_big_endian(#[case] ty: PrimitiveType, #[case] bytes: &[u8], #[case] expected: Value) {
    let mut session = ScriptSession::new(RamHost::default());
    session.mem().setblock(RAM_BASE + 0x100, bytes).unwrap();

    assert_eq!(session.mem().read(ty, RAM_BASE + 0x100).unwrap(), expected);
}

#[test]
fn blocks_and_strings_use_main_memory() {
    let mut session = ScriptSession::new(RamHost::default());

    session.mem().setstring(RAM_BASE + 0x40, "MARIO").unwrap();
    assert_eq!(session.mem().getstring(RAM_BASE + 0x40).unwrap(), "MARIO");
    assert_eq!(
        session.mem().getblock(RAM_BASE + 0x40, 6).unwrap(),
        b"MARIO\0".to_vec()
    );
}

#[test]
fn rom_accepts_float_writes_and_reads_every_type() {
    let mut session = ScriptSession::new(RamHost::default());

    session.rom().float().set(RAM_BASE + 0x20, 2.0).unwrap();
    session.rom().double().set(RAM_BASE + 0x28, -0.25).unwrap();

    assert_eq!(session.rom().u32().get(RAM_BASE + 0x20).unwrap(), 0x4000_0000);
    assert_eq!(session.rom().double().get(RAM_BASE + 0x28).unwrap(), -0.25);
    assert_eq!(session.rom().getblock(RAM_BASE + 0x20, 2).unwrap(), vec![0x40, 0x00]);
    assert_eq!(session.mem().u32().get(RAM_BASE + 0x20).unwrap(), 0);
}

#[test]
fn host_failures_surface_to_the_script() {
    let mut session = ScriptSession::new(RamHost::default());

    let read: Option<u32> = session.run(|s| s.mem().u32().get(0x1000));

    assert_eq!(read, None);
    assert_eq!(
        session.host().console,
        "error: host call `memory` failed: address 0x00001000 is unmapped\r\n"
    );
}

#[test]
fn registers_accept_names_and_pc() {
    let mut session = ScriptSession::new(RamHost::default());

    session.gpr().set_named("ra", 0x8024_0000).unwrap();
    session.gpr().set_named("pc", 0x8024_6DD8).unwrap();

    assert_eq!(session.gpr().get(31).unwrap(), 0x8024_0000);
    assert_eq!(session.host().pc, 0x8024_6DD8);
    assert!(session.gpr().get_named("zz").is_err());
}

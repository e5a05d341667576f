#![no_main]

use libfuzzer_sys::fuzz_target;
use script_core::{typedef, PrimitiveType, ScriptError, StructLayout};

const TAGS: [&str; 10] = [
    "u8", "u16", "u32", "s8", "s16", "s32", "float", "double", "u64", "",
];

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let base = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let names: Vec<String> = data[4..]
        .chunks(2)
        .map(|pair| format!("f{}", pair.get(1).copied().unwrap_or(0) % 16))
        .collect();
    let fields: Vec<(&str, &str)> = data[4..]
        .chunks(2)
        .zip(&names)
        .map(|(pair, name)| (name.as_str(), TAGS[usize::from(pair[0]) % TAGS.len()]))
        .collect();

    match StructLayout::from_tags(fields.iter().copied()) {
        Ok(layout) => {
            let mut offset = 0_u32;
            for field in layout.fields() {
                assert_eq!(field.offset, offset);
                offset += field.descriptor.ty.byte_width();
            }
            assert_eq!(layout.size(), offset);

            let ty = typedef(layout.fields().iter().map(|f| f.descriptor.clone()))
                .expect("layout fields are already unique");
            let first = ty.at(base);
            let wrapped = ty.element(base, u32::MAX);
            assert_eq!(first.len(), layout.len());
            assert_eq!(wrapped.len(), layout.len());
        }
        Err(ScriptError::UnrecognizedType(tag)) => {
            assert!(PrimitiveType::from_tag(&tag).is_err());
        }
        Err(ScriptError::DuplicateField(name)) => {
            assert!(names.iter().filter(|n| **n == name).count() > 1);
        }
        Err(other) => panic!("unexpected layout error: {other}"),
    }
});

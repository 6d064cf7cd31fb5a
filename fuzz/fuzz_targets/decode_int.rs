#![no_main]

use libfuzzer_sys::fuzz_target;
use asnread::{Mode, Reader};

macro_rules! decode_builtin {
    ( $data:expr, $fn:ident ) => {{
        let _ = Reader::new($data.to_vec(), Mode::Ber).$fn();
    }}
}

fuzz_target!(|data: &[u8]| {
    let _ = Reader::new(data.to_vec(), Mode::Ber).take_integer();
    let _ = Reader::new(data.to_vec(), Mode::Ber).take_unsigned();
    let _ = Reader::new(data.to_vec(), Mode::Ber).take_big_integer();

    decode_builtin!(data, try_take_i8);
    decode_builtin!(data, try_take_u8);
    decode_builtin!(data, try_take_i16);
    decode_builtin!(data, try_take_u16);
    decode_builtin!(data, try_take_i32);
    decode_builtin!(data, try_take_u32);
    decode_builtin!(data, try_take_i64);
    decode_builtin!(data, try_take_u64);
    decode_builtin!(data, try_take_i128);
    decode_builtin!(data, try_take_u128);
});

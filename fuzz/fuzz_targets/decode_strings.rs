#![no_main]

use libfuzzer_sys::fuzz_target;
use asnread::{Mode, Reader, Tag};

macro_rules! decode_strings {
    ( $data:expr, [ $( $mode:ident ),* ] ) => {{
        $(
            let take = Reader::new($data.to_vec(), Mode::$mode)
                .take_bit_string();
            let skip = {
                let mut reader = Reader::new($data.to_vec(), Mode::$mode);
                reader.take_bit_string_if(Tag::BIT_STRING).is_ok()
            };
            assert_eq!(take.is_ok(), skip);

            if let Ok(take) = take {
                assert!(take.unused() < 8);
                assert!(take.octet_len() > 0 || take.unused() == 0);
                assert_eq!(
                    take.bit_len(),
                    take.octet_len() * 8 - take.unused() as usize
                );
            }

            let _ = Reader::new($data.to_vec(), Mode::$mode)
                .take_octet_string();
            let _ = Reader::new($data.to_vec(), Mode::$mode)
                .try_take_primitive_octet_string();
            for number in [12u32, 18, 19, 22, 26, 28, 30] {
                let _ = Reader::new($data.to_vec(), Mode::$mode)
                    .take_character_string(number);
            }
        )*
    }}
}

fuzz_target!(|data: &[u8]| {
    decode_strings!(data, [Ber, Cer, Der]);
});

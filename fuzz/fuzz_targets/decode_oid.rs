#![no_main]

use libfuzzer_sys::fuzz_target;
use asnread::{ConstOid, Mode, Oid, Reader};

pub const SHA256: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 1]);

fuzz_target!(|data: &[u8]| {
    let mut take_reader = Reader::new(data.to_vec(), Mode::Ber);
    let take = take_reader.take_oid();
    let mut skip_reader = Reader::new(data.to_vec(), Mode::Ber);
    let skip = skip_reader.take_oid_string().is_ok();
    assert_eq!(take.is_ok(), skip);

    if let Ok(take) = take.as_ref() {
        let _ = take.to_string();
        let _ = take == &SHA256;
        for component in take.iter() {
            let _ = component.to_u32();
            let _ = component.to_biguint();
        }
    }
});

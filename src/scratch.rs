//! Pooled scratch buffers for string reassembly.
//!
//! Reassembling a constructed string into a caller-provided destination
//! needs an intermediate buffer: the destination must stay untouched until
//! the whole value has decoded successfully. The content may be key
//! material, so the intermediate buffer is wiped before it is handed back
//! to the pool, on success and failure alike.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use zeroize::Zeroize;

thread_local! {
    /// Buffers returned by dropped [`Scratch`] values, ready for reuse.
    static POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}

/// The number of buffers the pool holds on to.
const POOL_LIMIT: usize = 4;


//------------ Scratch -------------------------------------------------------

/// A temporary byte buffer rented from a thread-local pool.
///
/// Dereferences to a `Vec<u8>`. When dropped, the content is zeroed and
/// the allocation is returned to the pool. Since wiping happens in `Drop`,
/// it is guaranteed on every exit path, including early returns through
/// `?`.
pub struct Scratch {
    buf: Vec<u8>,
}

impl Scratch {
    /// Rents an empty buffer from the pool.
    pub fn rent() -> Self {
        let buf = POOL.with(|pool| {
            pool.borrow_mut().pop()
        }).unwrap_or_default();
        debug_assert!(buf.is_empty());
        Scratch { buf }
    }
}

impl Deref for Scratch {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for Scratch {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        self.buf.zeroize();
        let buf = std::mem::take(&mut self.buf);
        POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool.len() < POOL_LIMIT {
                pool.push(buf)
            }
        })
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rent_reuses_allocation() {
        let ptr = {
            let mut scratch = Scratch::rent();
            scratch.extend_from_slice(b"sensitive");
            scratch.as_ptr()
        };
        let scratch = Scratch::rent();
        if scratch.capacity() > 0 {
            assert_eq!(scratch.as_ptr(), ptr);
        }
        assert!(scratch.is_empty());
    }
}

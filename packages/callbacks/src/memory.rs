use std::marker::PhantomData;
use std::mem;
use std::slice;

/// A borrowed view into an `Option<&[u8]>` owned by the caller of a callback.
///
/// The view is only valid for the duration of the call it was passed into. The callee
/// must never store it and must copy the data if it needs to keep it.
/// `None` is fully supported, such that we can differentiate between an absent
/// value and an empty slice.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct U8SliceView<'a> {
    /// True if and only if this is None. If this is true, the other fields must be ignored.
    is_none: bool,
    ptr: *const u8,
    len: usize,
    _lifetime: PhantomData<&'a [u8]>,
}

impl<'a> U8SliceView<'a> {
    pub fn new(source: Option<&'a [u8]>) -> Self {
        match source {
            Some(data) => Self {
                is_none: false,
                ptr: data.as_ptr(),
                len: data.len(),
                _lifetime: PhantomData,
            },
            None => Self::none(),
        }
    }

    pub fn none() -> Self {
        Self {
            is_none: true,
            ptr: std::ptr::null::<u8>(),
            len: 0,
            _lifetime: PhantomData,
        }
    }

    /// Provides a reference to the included data to be parsed or copied elsewhere.
    /// This is safe as long as the `U8SliceView` was constructed with [`U8SliceView::new`]
    /// or by a caller honouring the same layout.
    pub fn read(&self) -> Option<&'a [u8]> {
        if self.is_none {
            None
        } else if self.len == 0 {
            // the pointer of an empty slice may be dangling or null on the other side
            Some(&[])
        } else {
            Some(unsafe { slice::from_raw_parts(self.ptr, self.len) })
        }
    }

    /// Creates an owned copy that can safely be stored and mutated.
    pub fn to_owned(&self) -> Option<Vec<u8>> {
        self.read().map(|slice| slice.to_owned())
    }
}

/// An optional vector type that requires explicit creation and destruction
/// and can be sent via FFI.
/// It can be created from `Option<Vec<u8>>` and be converted into `Option<Vec<u8>>`.
///
/// ## Ownership
///
/// Ownership is the right and the obligation to destroy an `UnmanagedVector`
/// exactly once.
///
/// Every output slot of a callback is an `UnmanagedVector` that the caller creates
/// in the `None` state. The host writes a new vector into the slot and thereby
/// transfers ownership to the caller, who must eventually call
/// [`UnmanagedVector::consume`] (from Rust) or [`destroy_unmanaged_vector`]
/// (from any other language). A slot that is not `None` when handed to a callback
/// means somebody forgot to release the previous vector. This is a bug in the
/// caller and is never silently overwritten.
///
/// An UnmanagedVector is immutable. If you want to mutate data, consume the
/// vector and create a new one:
///
/// ```rust
/// # use cosmwasm_callbacks::UnmanagedVector;
/// # let input = UnmanagedVector::new(Some(vec![0xAA]));
/// let mut mutable: Vec<u8> = input.consume().unwrap_or_default();
/// mutable.push(0xBB);
/// let output = UnmanagedVector::new(Some(mutable));
/// assert_eq!(output.consume(), Some(vec![0xAA, 0xBB]));
/// ```
#[repr(C)]
#[derive(Debug, PartialEq)]
pub struct UnmanagedVector {
    /// True if and only if this is None. If this is true, the other fields must be ignored.
    is_none: bool,
    ptr: *mut u8,
    len: usize,
    cap: usize,
}

impl UnmanagedVector {
    /// Consumes this optional vector for manual management.
    /// This is a zero-copy operation.
    pub fn new(source: Option<Vec<u8>>) -> Self {
        match source {
            Some(data) => {
                let mut data = mem::ManuallyDrop::new(data);
                Self {
                    is_none: false,
                    ptr: data.as_mut_ptr(),
                    len: data.len(),
                    cap: data.capacity(),
                }
            }
            None => Self::default(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.is_none
    }

    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Takes this UnmanagedVector and turns it into a regular, managed Rust vector.
    pub fn consume(self) -> Option<Vec<u8>> {
        if self.is_none {
            None
        } else {
            Some(unsafe { Vec::from_raw_parts(self.ptr, self.len, self.cap) })
        }
    }
}

impl Default for UnmanagedVector {
    fn default() -> Self {
        Self {
            is_none: true,
            ptr: std::ptr::null_mut::<u8>(),
            len: 0,
            cap: 0,
        }
    }
}

/// Writes `value` into an output slot the caller handed us.
///
/// Panics if the slot still holds a vector, since that vector would leak.
/// Callers run inside [`crate::panic::contain`], which reports the panic as
/// a contained fault.
///
/// # Safety
///
/// `slot` must be a valid, non-null pointer to an `UnmanagedVector`.
pub(crate) unsafe fn write_slot(slot: *mut UnmanagedVector, value: Option<Vec<u8>>) {
    assert_slot_empty(slot);
    slot.write(UnmanagedVector::new(value));
}

/// # Safety
///
/// `slot` must be a valid, non-null pointer to an `UnmanagedVector`.
pub(crate) unsafe fn assert_slot_empty(slot: *const UnmanagedVector) {
    if !(*slot).is_none() {
        panic!("Got a non-none UnmanagedVector we're about to override. This is a bug because someone has to drop the old one.");
    }
}

#[no_mangle]
pub extern "C" fn new_unmanaged_vector(
    nil: bool,
    ptr: *const u8,
    length: usize,
) -> UnmanagedVector {
    if nil {
        UnmanagedVector::new(None)
    } else if length == 0 {
        UnmanagedVector::new(Some(Vec::new()))
    } else {
        let external_memory = unsafe { slice::from_raw_parts(ptr, length) };
        UnmanagedVector::new(Some(Vec::from(external_memory)))
    }
}

#[no_mangle]
pub extern "C" fn destroy_unmanaged_vector(v: UnmanagedVector) {
    let _ = v.consume();
}

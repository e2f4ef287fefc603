//! Compact `Debug` output for the large pools carried by mesh and texture files.
//!
//! Used through `custom_debug`:
//!
//! ```ignore
//! #[derive(custom_debug::Debug)]
//! struct Pools {
//!     #[debug(with = age_utils::debug::trimmed_collection_fmt)]
//!     vertices: Vec<[f32; 3]>,
//! }
//! ```

use std::fmt;

const PREVIEW_ELEMENTS: usize = 3;

/// Anything that can show a short prefix of its elements.
pub trait Preview {
    type Item: fmt::Debug;

    fn element_count(&self) -> usize;
    fn head(&self, count: usize) -> &[Self::Item];
}

impl<T: fmt::Debug> Preview for [T] {
    type Item = T;

    fn element_count(&self) -> usize {
        self.len()
    }

    fn head(&self, count: usize) -> &[T] {
        &self[..count.min(self.len())]
    }
}

impl<T: fmt::Debug> Preview for Vec<T> {
    type Item = T;

    fn element_count(&self) -> usize {
        self.len()
    }

    fn head(&self, count: usize) -> &[T] {
        self.as_slice().head(count)
    }
}

#[cfg(not(feature = "debug-print-all"))]
pub fn trimmed_collection_fmt<T: Preview + fmt::Debug + ?Sized>(
    value: &T,
    f: &mut fmt::Formatter,
) -> fmt::Result {
    let head = value.head(PREVIEW_ELEMENTS);
    let rest = value.element_count() - head.len();
    if rest == 0 {
        write!(f, "{:?}", head)
    } else {
        write!(f, "{:?} + {} elements", head, rest)
    }
}

#[cfg(feature = "debug-print-all")]
pub fn trimmed_collection_fmt<T: Preview + fmt::Debug + ?Sized>(
    value: &T,
    f: &mut fmt::Formatter,
) -> fmt::Result {
    write!(f, "{:?}", value)
}

/// Same as [`trimmed_collection_fmt`] for optional pools.
pub fn option_trimmed_collection_fmt<T: Preview + fmt::Debug>(
    value: &Option<T>,
    f: &mut fmt::Formatter,
) -> fmt::Result {
    match value {
        Some(inner) => {
            f.write_str("Some(")?;
            trimmed_collection_fmt(inner, f)?;
            f.write_str(")")
        }
        None => f.write_str("None"),
    }
}

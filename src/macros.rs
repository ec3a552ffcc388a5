//! # Internal Macros
//!
//! ## header_accessors!
//!
//! Generates getter and setter methods for the little-endian `U32` fields of
//! the zerocopy page and record headers.
//!
//! ```ignore
//! #[repr(C)]
//! struct PageHeader {
//!     record_count: U32,
//! }
//!
//! impl PageHeader {
//!     header_accessors! {
//!         record_count,
//!     }
//! }
//!
//! // Generates:
//! // pub fn record_count(&self) -> u32 { self.record_count.get() }
//! // pub fn set_record_count(&mut self, val: u32) { self.record_count = U32::new(val); }
//! ```

#[macro_export]
macro_rules! header_accessors {
    ($($field:ident),* $(,)?) => {
        $(
            ::paste::paste! {
                #[inline]
                pub fn $field(&self) -> u32 {
                    self.$field.get()
                }

                #[inline]
                pub fn [<set_ $field>](&mut self, val: u32) {
                    self.$field = ::zerocopy::little_endian::U32::new(val);
                }
            }
        )*
    };
}

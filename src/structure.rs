//! emmc-sdhc - Useful macros for parsing SD card registers.
//!
//! Card registers are captured as 32-bit words, highest word first, exactly
//! as the host hands them over. Fields are described by word index, mask and
//! shift.

macro_rules! access_field {
    ($self:expr, $word:expr, $mask:expr, bool) => {
        ($self.words()[$word] & $mask) != 0
    };
    ($self:expr, $word:expr, $mask:expr, $shift:expr) => {
        ($self.words()[$word] & $mask) >> $shift
    };
}

macro_rules! define_field {
    ($name:ident, bool, $word:expr, $mask:expr) => {
        doc_comment::doc_comment! {
            concat!("Get the value of the ", stringify!($name), " flag"),
            pub fn $name(&self) -> bool {
                access_field!(self, $word, $mask, bool)
            }
        }
    };
    ($name:ident, $type:ty, $word:expr, $mask:expr, $shift:expr) => {
        doc_comment::doc_comment! {
            concat!("Get the value of the ", stringify!($name), " field"),
            pub fn $name(&self) -> $type {
                access_field!(self, $word, $mask, $shift) as $type
            }
        }
    };
    ($name:ident, $type:ty, [ $( ( $word:expr, $mask:expr, $shift:expr, $num_bits:expr ) ),+ ]) => {
        doc_comment::doc_comment! {
            concat!("Get the value of the ", stringify!($name), " field"),
            pub fn $name(&self) -> $type {
                let mut result: $type = 0;
                $(
                    result <<= $num_bits;
                    let part = access_field!(self, $word, $mask, $shift) as $type;
                    result |= part;
                )+
                result
            }
        }
    };
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************

//! Access permissions recorded in the `/P` entry of the encryption dictionary.

use serde::{Deserialize, Serialize};

const PRINT: u32 = 1 << 2;
const MODIFY: u32 = 1 << 3;
const COPY: u32 = 1 << 4;
const ANNOTATE: u32 = 1 << 5;
const FILL_FORMS: u32 = 1 << 8;
const EXTRACT_ACCESSIBILITY: u32 = 1 << 9;
const ASSEMBLE: u32 = 1 << 10;
const PRINT_HIGH_QUALITY: u32 = 1 << 11;

/// Bits 1-2 are reserved (must be 0), bits 7-8 and 13-32 must be 1.
const RESERVED_ONES: u32 = 0xFFFF_F0C0;

/// What a user who opens the document with the user password may do.
///
/// Viewers enforce these flags; they are not cryptographic guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub print: bool,
    pub modify: bool,
    pub copy: bool,
    pub annotate: bool,
    pub fill_forms: bool,
    pub extract_accessibility: bool,
    pub assemble: bool,
    pub print_high_quality: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self::all()
    }
}

impl Permissions {
    /// Everything allowed.
    pub fn all() -> Self {
        Self {
            print: true,
            modify: true,
            copy: true,
            annotate: true,
            fill_forms: true,
            extract_accessibility: true,
            assemble: true,
            print_high_quality: true,
        }
    }

    /// Nothing allowed.
    pub fn none() -> Self {
        Self {
            print: false,
            modify: false,
            copy: false,
            annotate: false,
            fill_forms: false,
            extract_accessibility: false,
            assemble: false,
            print_high_quality: false,
        }
    }

    /// Allow or forbid printing.
    pub fn with_print(mut self, allow: bool) -> Self {
        self.print = allow;
        self
    }

    /// Allow or forbid content modification.
    pub fn with_modify(mut self, allow: bool) -> Self {
        self.modify = allow;
        self
    }

    /// Allow or forbid copying text and graphics.
    pub fn with_copy(mut self, allow: bool) -> Self {
        self.copy = allow;
        self
    }

    /// Allow or forbid adding annotations.
    pub fn with_annotate(mut self, allow: bool) -> Self {
        self.annotate = allow;
        self
    }

    /// The signed 32-bit `/P` value.
    pub fn to_p_value(&self) -> i32 {
        let mut p = RESERVED_ONES;
        let flags = [
            (self.print, PRINT),
            (self.modify, MODIFY),
            (self.copy, COPY),
            (self.annotate, ANNOTATE),
            (self.fill_forms, FILL_FORMS),
            (self.extract_accessibility, EXTRACT_ACCESSIBILITY),
            (self.assemble, ASSEMBLE),
            (self.print_high_quality, PRINT_HIGH_QUALITY),
        ];
        for (allowed, bit) in flags {
            if allowed {
                p |= bit;
            }
        }
        p as i32
    }

    /// Decode a `/P` value.
    pub fn from_p_value(p: i32) -> Self {
        let p = p as u32;
        Self {
            print: p & PRINT != 0,
            modify: p & MODIFY != 0,
            copy: p & COPY != 0,
            annotate: p & ANNOTATE != 0,
            fill_forms: p & FILL_FORMS != 0,
            extract_accessibility: p & EXTRACT_ACCESSIBILITY != 0,
            assemble: p & ASSEMBLE != 0,
            print_high_quality: p & PRINT_HIGH_QUALITY != 0,
        }
    }
}

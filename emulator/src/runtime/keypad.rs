use bitflags::bitflags;

bitflags! {
    /// State of the 16-key hexadecimal keypad, one bit per key
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Keys: u16 {
        const KEY_0 = 1 << 0x0;
        const KEY_1 = 1 << 0x1;
        const KEY_2 = 1 << 0x2;
        const KEY_3 = 1 << 0x3;
        const KEY_4 = 1 << 0x4;
        const KEY_5 = 1 << 0x5;
        const KEY_6 = 1 << 0x6;
        const KEY_7 = 1 << 0x7;
        const KEY_8 = 1 << 0x8;
        const KEY_9 = 1 << 0x9;
        const KEY_A = 1 << 0xA;
        const KEY_B = 1 << 0xB;
        const KEY_C = 1 << 0xC;
        const KEY_D = 1 << 0xD;
        const KEY_E = 1 << 0xE;
        const KEY_F = 1 << 0xF;
    }
}

impl Default for Keys {
    fn default() -> Self {
        Keys::empty()
    }
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018b}", self.bits())
    }
}

impl Keys {
    /// The flag for a given key. Only the low nibble is used.
    #[must_use]
    pub fn key(key: u8) -> Keys {
        Keys::from_bits_retain(1 << (key & 0xF))
    }

    #[must_use]
    pub fn is_pressed(&self, key: u8) -> bool {
        self.contains(Keys::key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_test() {
        assert_eq!(Keys::key(0), Keys::KEY_0);
        assert_eq!(Keys::key(0xA), Keys::KEY_A);
        // Only the low nibble selects the key
        assert_eq!(Keys::key(0x1F), Keys::KEY_F);
    }

    #[test]
    fn is_pressed_test() {
        let keys = Keys::KEY_3 | Keys::KEY_F;
        assert!(keys.is_pressed(3));
        assert!(keys.is_pressed(0xF));
        assert!(!keys.is_pressed(4));
        assert!(!Keys::default().is_pressed(0));
    }
}

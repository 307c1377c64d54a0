//! Messages accepted by the UI task.

use crate::matrix::KeyCoord;

/// A request for the UI, consumed at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiMessage {
    /// Sent once at boot.
    Startup,
    /// Wake button went down on its own.
    WakePressed,
    /// Wake button held together with a matrix key (first key in scan order).
    WakeAndKeyPressed(KeyCoord),
    /// A matrix key went down while a page is showing.
    KeyPressed(KeyCoord),
    /// The host asks the user to compare a passkey.
    ConfirmPasskeyRequested(u32),
    /// The host asks the user to type a passkey.
    DisplayPasskeyRequested(u32),
    /// Periodic tick without input.
    NoMessage,
}

/// Payload-free tag of a [`UiMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    Startup,
    WakePressed,
    WakeAndKeyPressed,
    KeyPressed,
    ConfirmPasskeyRequested,
    DisplayPasskeyRequested,
    NoMessage,
}

impl UiMessage {
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Startup => MessageKind::Startup,
            Self::WakePressed => MessageKind::WakePressed,
            Self::WakeAndKeyPressed(_) => MessageKind::WakeAndKeyPressed,
            Self::KeyPressed(_) => MessageKind::KeyPressed,
            Self::ConfirmPasskeyRequested(_) => MessageKind::ConfirmPasskeyRequested,
            Self::DisplayPasskeyRequested(_) => MessageKind::DisplayPasskeyRequested,
            Self::NoMessage => MessageKind::NoMessage,
        }
    }

    /// Key carried by key-bearing messages.
    pub const fn key(&self) -> Option<KeyCoord> {
        match self {
            Self::WakeAndKeyPressed(key) | Self::KeyPressed(key) => Some(*key),
            _ => None,
        }
    }

    /// Passkey carried by pairing messages.
    pub const fn passkey(&self) -> Option<u32> {
        match self {
            Self::ConfirmPasskeyRequested(passkey) | Self::DisplayPasskeyRequested(passkey) => {
                Some(*passkey)
            }
            _ => None,
        }
    }

    /// `false` only for the tick placeholder.
    pub const fn is_message(&self) -> bool {
        !matches!(self, Self::NoMessage)
    }

    /// `true` if this is `KeyPressed(key)`.
    pub fn is_key_press(&self, key: KeyCoord) -> bool {
        matches!(self, Self::KeyPressed(k) if *k == key)
    }

    /// `true` if this is `WakeAndKeyPressed(key)`.
    pub fn is_chord(&self, key: KeyCoord) -> bool {
        matches!(self, Self::WakeAndKeyPressed(k) if *k == key)
    }
}

/// Numeric value of a passkey given as six ASCII digits, the form the
/// SoftDevice hands out.  Non-digits count as zero.
pub fn passkey_from_ascii(digits: &[u8; 6]) -> u32 {
    digits.iter().fold(0, |acc, &d| {
        let digit = if d.is_ascii_digit() { d - b'0' } else { 0 };
        acc * 10 + u32::from(digit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passkey_digits() {
        assert_eq!(passkey_from_ascii(b"004321"), 4_321);
        assert_eq!(passkey_from_ascii(b"999999"), 999_999);
        assert_eq!(passkey_from_ascii(b"12x456"), 120_456);
    }

    #[test]
    fn only_key_messages_carry_keys() {
        let key = KeyCoord::new(2, 2);
        assert!(UiMessage::KeyPressed(key).is_key_press(key));
        assert!(!UiMessage::KeyPressed(key).is_chord(key));
        assert_eq!(UiMessage::ConfirmPasskeyRequested(5).key(), None);
        assert_eq!(UiMessage::Startup.passkey(), None);
    }
}

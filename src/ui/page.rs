//! UI pages, their triggers and their per-page state.

use crate::config::{
    CHORD_APPS, CHORD_DEBUG, CHORD_HELP, CHORD_SHUTDOWN, CHORD_SWAP_MODIFIERS,
};
use crate::matrix::KeyCoord;
use crate::ui::anim::AnimState;
use crate::ui::message::{MessageKind, UiMessage};

/// Which page is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiPage {
    /// Display off.
    Disabled,
    Startup,
    Shutdown,
    Debug,
    ConfirmPasskey,
    DisplayPasskey,
    SwapModifiers,
    Help,
    AppsMenu,
    Idle,
}

/// Key part of a page trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerKey {
    Any,
    Key(KeyCoord),
}

/// How a page is opened and whether it lets other pages take over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PageConfig {
    pub trigger: MessageKind,
    pub trigger_key: TriggerKey,
    /// While showing, incoming messages may open other pages.
    pub navigable: bool,
}

impl PageConfig {
    const fn on(trigger: MessageKind, navigable: bool) -> Self {
        Self {
            trigger,
            trigger_key: TriggerKey::Any,
            navigable,
        }
    }

    const fn chord(key: KeyCoord, navigable: bool) -> Self {
        Self {
            trigger: MessageKind::WakeAndKeyPressed,
            trigger_key: TriggerKey::Key(key),
            navigable,
        }
    }

    pub fn matches(&self, msg: &UiMessage) -> bool {
        if msg.kind() != self.trigger {
            return false;
        }
        match self.trigger_key {
            TriggerKey::Any => true,
            TriggerKey::Key(key) => msg.key() == Some(key),
        }
    }
}

impl UiPage {
    /// Match order for navigation.
    pub const ALL: [UiPage; 10] = [
        UiPage::Disabled,
        UiPage::Startup,
        UiPage::Shutdown,
        UiPage::Debug,
        UiPage::ConfirmPasskey,
        UiPage::DisplayPasskey,
        UiPage::SwapModifiers,
        UiPage::Help,
        UiPage::AppsMenu,
        UiPage::Idle,
    ];

    pub const fn config(self) -> PageConfig {
        match self {
            // Ticks never navigate, so nothing opens Disabled.
            UiPage::Disabled => PageConfig::on(MessageKind::NoMessage, true),
            UiPage::Startup => PageConfig::on(MessageKind::Startup, false),
            UiPage::Shutdown => PageConfig::chord(CHORD_SHUTDOWN, false),
            UiPage::Debug => PageConfig::chord(CHORD_DEBUG, true),
            UiPage::ConfirmPasskey => PageConfig::on(MessageKind::ConfirmPasskeyRequested, false),
            UiPage::DisplayPasskey => PageConfig::on(MessageKind::DisplayPasskeyRequested, true),
            UiPage::SwapModifiers => PageConfig::chord(CHORD_SWAP_MODIFIERS, true),
            UiPage::Help => PageConfig::chord(CHORD_HELP, true),
            UiPage::AppsMenu => PageConfig::chord(CHORD_APPS, false),
            UiPage::Idle => PageConfig::on(MessageKind::WakePressed, true),
        }
    }

    pub const fn is_navigable(self) -> bool {
        self.config().navigable
    }

    /// First page whose trigger matches `msg`.
    pub fn for_message(msg: &UiMessage) -> Option<UiPage> {
        Self::ALL
            .into_iter()
            .find(|page| page.config().matches(msg))
    }
}

/// The current page together with the state only that page uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Page {
    Disabled,
    Startup(AnimState),
    Shutdown(AnimState),
    Debug,
    ConfirmPasskey { passkey: u32 },
    DisplayPasskey { passkey: u32 },
    /// `shown_at_ms` is set once the swap has been applied.
    SwapModifiers { shown_at_ms: Option<u64> },
    Help,
    AppsMenu,
    Idle(AnimState),
}

impl Page {
    /// `kind` with fresh state.
    pub const fn open(kind: UiPage) -> Self {
        match kind {
            UiPage::Disabled => Page::Disabled,
            UiPage::Startup => Page::Startup(AnimState::new()),
            UiPage::Shutdown => Page::Shutdown(AnimState::new()),
            UiPage::Debug => Page::Debug,
            UiPage::ConfirmPasskey => Page::ConfirmPasskey { passkey: 0 },
            UiPage::DisplayPasskey => Page::DisplayPasskey { passkey: 0 },
            UiPage::SwapModifiers => Page::SwapModifiers { shown_at_ms: None },
            UiPage::Help => Page::Help,
            UiPage::AppsMenu => Page::AppsMenu,
            UiPage::Idle => Page::Idle(AnimState::new()),
        }
    }

    pub const fn kind(&self) -> UiPage {
        match self {
            Page::Disabled => UiPage::Disabled,
            Page::Startup(_) => UiPage::Startup,
            Page::Shutdown(_) => UiPage::Shutdown,
            Page::Debug => UiPage::Debug,
            Page::ConfirmPasskey { .. } => UiPage::ConfirmPasskey,
            Page::DisplayPasskey { .. } => UiPage::DisplayPasskey,
            Page::SwapModifiers { .. } => UiPage::SwapModifiers,
            Page::Help => UiPage::Help,
            Page::AppsMenu => UiPage::AppsMenu,
            Page::Idle(_) => UiPage::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CHORD_HELP, PASSKEY_ACCEPT_KEY};

    #[test]
    fn chords_select_pages() {
        assert_eq!(
            UiPage::for_message(&UiMessage::WakeAndKeyPressed(CHORD_HELP)),
            Some(UiPage::Help)
        );
        assert_eq!(
            UiPage::for_message(&UiMessage::WakeAndKeyPressed(CHORD_SHUTDOWN)),
            Some(UiPage::Shutdown)
        );
        assert_eq!(
            UiPage::for_message(&UiMessage::WakeAndKeyPressed(KeyCoord::new(3, 3))),
            None
        );
    }

    #[test]
    fn wildcard_triggers_ignore_payload() {
        assert_eq!(
            UiPage::for_message(&UiMessage::DisplayPasskeyRequested(123_456)),
            Some(UiPage::DisplayPasskey)
        );
        assert_eq!(
            UiPage::for_message(&UiMessage::ConfirmPasskeyRequested(1)),
            Some(UiPage::ConfirmPasskey)
        );
        assert_eq!(UiPage::for_message(&UiMessage::WakePressed), Some(UiPage::Idle));
        assert_eq!(UiPage::for_message(&UiMessage::Startup), Some(UiPage::Startup));
    }

    #[test]
    fn plain_key_presses_open_nothing() {
        assert_eq!(UiPage::for_message(&UiMessage::KeyPressed(CHORD_HELP)), None);
        assert_eq!(UiPage::for_message(&UiMessage::KeyPressed(PASSKEY_ACCEPT_KEY)), None);
    }

    #[test]
    fn open_and_kind_agree() {
        for kind in UiPage::ALL {
            assert_eq!(Page::open(kind).kind(), kind);
        }
    }

    #[test]
    fn dialogs_and_animations_are_not_navigable() {
        for kind in [
            UiPage::Startup,
            UiPage::Shutdown,
            UiPage::ConfirmPasskey,
            UiPage::AppsMenu,
        ] {
            assert!(!kind.is_navigable());
        }
        for kind in [
            UiPage::Disabled,
            UiPage::Debug,
            UiPage::DisplayPasskey,
            UiPage::SwapModifiers,
            UiPage::Help,
            UiPage::Idle,
        ] {
            assert!(kind.is_navigable());
        }
    }
}

//! Global keyboard shortcuts for the search surface
//!
//! `Ctrl+K` / `Cmd+K` opens search from anywhere and `Escape` closes it while
//! it is open. Shortcuts fire on the press edge only: auto-repeat events and
//! presses of a key that is still held are ignored.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Other,
}

impl Key {
    /// Letters compare case-insensitively so Shift does not change identity
    fn normalized(self) -> Self {
        match self {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Ctrl on Linux/Windows, Cmd on macOS
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub state: KeyState,

    /// Set by the host for auto-repeat events while a key is held
    pub repeat: bool,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            state: KeyState::Pressed,
            repeat: false,
        }
    }

    pub fn release(key: Key) -> Self {
        Self {
            state: KeyState::Released,
            ..Self::press(key)
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Open,
    Close,
}

/// Maps key events to search-surface actions
#[derive(Debug, Default)]
pub struct ShortcutHandler {
    held: HashSet<Key>,
}

impl ShortcutHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &KeyEvent, is_open: bool) -> Option<ShortcutAction> {
        let key = event.key.normalized();
        match event.state {
            KeyState::Released => {
                self.held.remove(&key);
                None
            }
            KeyState::Pressed => {
                if event.repeat || !self.held.insert(key) {
                    return None;
                }
                match key {
                    Key::Char('k') if event.modifiers.command() => Some(ShortcutAction::Open),
                    Key::Escape if is_open => Some(ShortcutAction::Close),
                    _ => None,
                }
            }
        }
    }
}

/// Receiver of key events from a [`KeyboardHub`]
pub trait KeyListener: Send + Sync {
    /// Returns true if the event was consumed
    fn on_key(&self, event: &KeyEvent) -> bool;
}

type Slot = Mutex<Option<(u64, Arc<dyn KeyListener>)>>;

/// The host's single global key listener slot
///
/// At most one listener is attached at a time. Attaching hands back a
/// [`ListenerGuard`]; dropping the guard detaches the listener.
#[derive(Clone, Default)]
pub struct KeyboardHub {
    slot: Arc<Slot>,
    next_id: Arc<AtomicU64>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, listener: Arc<dyn KeyListener>) -> Result<ListenerGuard> {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return Err(SessionError::ListenerAttached);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *slot = Some((id, listener));
        debug!("Attached keyboard listener {}", id);

        Ok(ListenerGuard {
            slot: Arc::downgrade(&self.slot),
            id,
        })
    }

    /// Deliver an event to the attached listener, if any
    pub fn dispatch(&self, event: &KeyEvent) -> bool {
        // Clone out of the slot so the listener may attach/detach while running
        let listener = self.slot.lock().as_ref().map(|(_, l)| Arc::clone(l));
        listener.is_some_and(|listener| listener.on_key(event))
    }

    pub fn is_attached(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// Keeps a listener attached to a [`KeyboardHub`] for as long as it lives
#[must_use = "dropping the guard detaches the listener immediately"]
pub struct ListenerGuard {
    slot: Weak<Slot>,
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let mut slot = slot.lock();
        if slot.as_ref().is_some_and(|(id, _)| *id == self.id) {
            *slot = None;
            debug!("Detached keyboard listener {}", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_ctrl_or_cmd_k_opens() {
        let mut handler = ShortcutHandler::new();
        let ctrl_k = KeyEvent::press(Key::Char('k')).with_ctrl();
        assert_eq!(handler.handle(&ctrl_k, false), Some(ShortcutAction::Open));
        handler.handle(&KeyEvent::release(Key::Char('k')), true);

        let cmd_k = KeyEvent::press(Key::Char('K')).with_meta();
        assert_eq!(handler.handle(&cmd_k, false), Some(ShortcutAction::Open));
    }

    #[test]
    fn test_plain_k_does_nothing() {
        let mut handler = ShortcutHandler::new();
        assert_eq!(handler.handle(&KeyEvent::press(Key::Char('k')), false), None);
    }

    #[test]
    fn test_escape_only_closes_when_open() {
        let mut handler = ShortcutHandler::new();
        assert_eq!(handler.handle(&KeyEvent::press(Key::Escape), false), None);
        handler.handle(&KeyEvent::release(Key::Escape), false);
        assert_eq!(
            handler.handle(&KeyEvent::press(Key::Escape), true),
            Some(ShortcutAction::Close)
        );
    }

    #[test]
    fn test_edge_triggered() {
        let mut handler = ShortcutHandler::new();
        let ctrl_k = KeyEvent::press(Key::Char('k')).with_ctrl();

        assert_eq!(handler.handle(&ctrl_k, false), Some(ShortcutAction::Open));
        assert_eq!(handler.handle(&ctrl_k.repeated(), true), None);
        // Held without a release in between
        assert_eq!(handler.handle(&ctrl_k, true), None);

        handler.handle(&KeyEvent::release(Key::Char('k')), true);
        assert_eq!(handler.handle(&ctrl_k, false), Some(ShortcutAction::Open));
    }

    struct Counter(AtomicUsize);

    impl KeyListener for Counter {
        fn on_key(&self, _event: &KeyEvent) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn test_hub_single_slot_and_guard() {
        let hub = KeyboardHub::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let event = KeyEvent::press(Key::Enter);

        assert!(!hub.dispatch(&event));

        let guard = hub.attach(counter.clone()).unwrap();
        assert!(hub.is_attached());
        assert!(matches!(
            hub.attach(counter.clone()),
            Err(SessionError::ListenerAttached)
        ));
        assert!(hub.dispatch(&event));

        drop(guard);
        assert!(!hub.is_attached());
        assert!(!hub.dispatch(&event));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        let _guard = hub.attach(counter).unwrap();
        assert!(hub.is_attached());
    }

    #[test]
    fn test_guard_outliving_hub() {
        let hub = KeyboardHub::new();
        let guard = hub.attach(Arc::new(Counter(AtomicUsize::new(0)))).unwrap();
        drop(hub);
        drop(guard);
    }
}

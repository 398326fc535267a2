//! Live keyboard input from an evdev device
//!
//! Reads key events from one keyboard, turns them into [`KeyboardEvent`]s
//! at the document and reports every action the bindings fire. The device
//! is never grabbed; other applications keep receiving input.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use evdev::{Device, InputEventKind, Key};
use hotkey_mux_dispatch::{KeyboardEvent, KeyboardState};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::bindings::Bindings;

/// How often pending sequences are checked for expiry
const TIMEOUT_TICK: Duration = Duration::from_millis(50);

/// Information about an input device
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
    pub vendor: u16,
    pub product: u16,
}

impl DeviceInfo {
    pub fn vendor_product(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor, self.product)
    }
}

/// Enumerate keyboards under /dev/input
pub fn list_keyboards() -> Result<Vec<DeviceInfo>> {
    let mut keyboards = Vec::new();

    for entry in std::fs::read_dir("/dev/input").context("Failed to read /dev/input")? {
        let path = entry?.path();

        let is_event_node = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false);
        if !is_event_node {
            continue;
        }

        // Skip devices we can't open
        let Ok(device) = Device::open(&path) else {
            continue;
        };
        if !is_keyboard(&device) {
            continue;
        }

        let id = device.input_id();
        keyboards.push(DeviceInfo {
            name: device.name().unwrap_or("Unknown").to_string(),
            vendor: id.vendor(),
            product: id.product(),
            path,
        });
    }

    keyboards.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(keyboards)
}

/// Check if a device is a keyboard
fn is_keyboard(device: &Device) -> bool {
    device.supported_events().contains(evdev::EventType::KEY)
        && device
            .supported_keys()
            .map(|keys| keys.contains(Key::KEY_A))
            .unwrap_or(false)
}

/// Feed a keyboard's events through `bindings` until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the device can't be opened, isn't a keyboard, or
/// stops delivering events.
pub async fn run(bindings: &Bindings, path: &Path, json: bool) -> Result<()> {
    let device = Device::open(path)
        .with_context(|| format!("Failed to open input device {}", path.display()))?;
    if !is_keyboard(&device) {
        bail!("{} is not a keyboard", path.display());
    }
    let name = device.name().unwrap_or("Unknown").to_string();

    let mut stream = device
        .into_event_stream()
        .with_context(|| format!("Failed to create event stream for device '{}'", name))?;
    let mut ticks = IntervalStream::new(tokio::time::interval(TIMEOUT_TICK));
    let mut keyboard = KeyboardState::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!("Listening on '{}' ({})", name, path.display());

    loop {
        tokio::select! {
            event = stream.next_event() => {
                let event = event.with_context(|| format!("Lost input device '{}'", name))?;
                if let InputEventKind::Key(key) = event.kind() {
                    if let Some(event) = key_event(&mut keyboard, key, event.value()) {
                        bindings.dispatch(&event);
                        report(bindings, json)?;
                    }
                }
            }
            Some(_) = ticks.next() => {
                bindings.runtime().sequences().check_timeouts();
            }
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl+C")?;
                break;
            }
        }
    }

    tracing::info!("Stopped listening on '{}'", name);
    Ok(())
}

/// Print what fired since the last report.
fn report(bindings: &Bindings, json: bool) -> Result<()> {
    for fired in bindings.take_fired() {
        if json {
            println!("{}", serde_json::to_string(&fired)?);
        } else {
            println!("{}", fired);
        }
    }
    Ok(())
}

/// Translate one evdev key event. Value 0 is a release, 1 a press and 2
/// an autorepeat.
fn key_event(keyboard: &mut KeyboardState, key: Key, value: i32) -> Option<KeyboardEvent> {
    let name = key_name(key)?;
    match value {
        0 => Some(keyboard.key_up(name)),
        1 | 2 => Some(keyboard.key_down(name)),
        _ => None,
    }
}

/// Canonical key name for an evdev key. Left and right modifiers share a
/// name.
fn key_name(key: Key) -> Option<&'static str> {
    let name = match key {
        // Modifiers
        Key::KEY_LEFTCTRL | Key::KEY_RIGHTCTRL => "Control",
        Key::KEY_LEFTSHIFT | Key::KEY_RIGHTSHIFT => "Shift",
        Key::KEY_LEFTALT | Key::KEY_RIGHTALT => "Alt",
        Key::KEY_LEFTMETA | Key::KEY_RIGHTMETA => "Meta",

        // Letters
        Key::KEY_A => "A",
        Key::KEY_B => "B",
        Key::KEY_C => "C",
        Key::KEY_D => "D",
        Key::KEY_E => "E",
        Key::KEY_F => "F",
        Key::KEY_G => "G",
        Key::KEY_H => "H",
        Key::KEY_I => "I",
        Key::KEY_J => "J",
        Key::KEY_K => "K",
        Key::KEY_L => "L",
        Key::KEY_M => "M",
        Key::KEY_N => "N",
        Key::KEY_O => "O",
        Key::KEY_P => "P",
        Key::KEY_Q => "Q",
        Key::KEY_R => "R",
        Key::KEY_S => "S",
        Key::KEY_T => "T",
        Key::KEY_U => "U",
        Key::KEY_V => "V",
        Key::KEY_W => "W",
        Key::KEY_X => "X",
        Key::KEY_Y => "Y",
        Key::KEY_Z => "Z",

        // Number row
        Key::KEY_0 => "0",
        Key::KEY_1 => "1",
        Key::KEY_2 => "2",
        Key::KEY_3 => "3",
        Key::KEY_4 => "4",
        Key::KEY_5 => "5",
        Key::KEY_6 => "6",
        Key::KEY_7 => "7",
        Key::KEY_8 => "8",
        Key::KEY_9 => "9",

        // Editing and whitespace
        Key::KEY_ESC => "Escape",
        Key::KEY_ENTER | Key::KEY_KPENTER => "Enter",
        Key::KEY_TAB => "Tab",
        Key::KEY_SPACE => "Space",
        Key::KEY_BACKSPACE => "Backspace",
        Key::KEY_DELETE => "Delete",
        Key::KEY_INSERT => "Insert",

        // Locks and system keys
        Key::KEY_CAPSLOCK => "CapsLock",
        Key::KEY_NUMLOCK => "NumLock",
        Key::KEY_SCROLLLOCK => "ScrollLock",
        Key::KEY_SYSRQ => "PrintScreen",
        Key::KEY_PAUSE => "Pause",
        Key::KEY_COMPOSE => "ContextMenu",

        // Navigation
        Key::KEY_UP => "ArrowUp",
        Key::KEY_DOWN => "ArrowDown",
        Key::KEY_LEFT => "ArrowLeft",
        Key::KEY_RIGHT => "ArrowRight",
        Key::KEY_HOME => "Home",
        Key::KEY_END => "End",
        Key::KEY_PAGEUP => "PageUp",
        Key::KEY_PAGEDOWN => "PageDown",

        // Symbols
        Key::KEY_MINUS => "-",
        Key::KEY_EQUAL => "=",
        Key::KEY_LEFTBRACE => "[",
        Key::KEY_RIGHTBRACE => "]",
        Key::KEY_SEMICOLON => ";",
        Key::KEY_APOSTROPHE => "'",
        Key::KEY_GRAVE => "`",
        Key::KEY_BACKSLASH => "\\",
        Key::KEY_COMMA => ",",
        Key::KEY_DOT => ".",
        Key::KEY_SLASH => "/",

        // Function keys
        Key::KEY_F1 => "F1",
        Key::KEY_F2 => "F2",
        Key::KEY_F3 => "F3",
        Key::KEY_F4 => "F4",
        Key::KEY_F5 => "F5",
        Key::KEY_F6 => "F6",
        Key::KEY_F7 => "F7",
        Key::KEY_F8 => "F8",
        Key::KEY_F9 => "F9",
        Key::KEY_F10 => "F10",
        Key::KEY_F11 => "F11",
        Key::KEY_F12 => "F12",
        Key::KEY_F13 => "F13",
        Key::KEY_F14 => "F14",
        Key::KEY_F15 => "F15",
        Key::KEY_F16 => "F16",
        Key::KEY_F17 => "F17",
        Key::KEY_F18 => "F18",
        Key::KEY_F19 => "F19",
        Key::KEY_F20 => "F20",
        Key::KEY_F21 => "F21",
        Key::KEY_F22 => "F22",
        Key::KEY_F23 => "F23",
        Key::KEY_F24 => "F24",

        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use hotkey_mux_core::{canonical_key, parse_config_str, Modifier, Platform};
    use hotkey_mux_dispatch::{HotkeyRuntime, KeyEventKind};

    use super::*;

    #[test]
    fn test_key_name_modifiers() {
        assert_eq!(key_name(Key::KEY_LEFTCTRL), Some("Control"));
        assert_eq!(key_name(Key::KEY_RIGHTCTRL), Some("Control"));
        assert_eq!(key_name(Key::KEY_RIGHTALT), Some("Alt"));
        assert_eq!(key_name(Key::KEY_LEFTMETA), Some("Meta"));
        for key in [Key::KEY_LEFTSHIFT, Key::KEY_RIGHTSHIFT] {
            assert_eq!(key_name(key).and_then(Modifier::from_key_name), Some(Modifier::Shift));
        }
    }

    #[test]
    fn test_key_names_are_canonical() {
        let keys = [
            Key::KEY_A,
            Key::KEY_Z,
            Key::KEY_0,
            Key::KEY_ESC,
            Key::KEY_KPENTER,
            Key::KEY_UP,
            Key::KEY_PAGEDOWN,
            Key::KEY_SYSRQ,
            Key::KEY_GRAVE,
            Key::KEY_F24,
        ];
        for key in keys {
            let name = key_name(key).expect("should map");
            assert_eq!(canonical_key(name), name, "{:?} maps to a non-canonical name", key);
        }
    }

    #[test]
    fn test_key_name_unmapped() {
        assert_eq!(key_name(Key::BTN_LEFT), None);
        assert_eq!(key_name(Key::KEY_VOLUMEUP), None);
    }

    #[test]
    fn test_key_event_values() {
        let mut keyboard = KeyboardState::new();

        let press = key_event(&mut keyboard, Key::KEY_J, 1).expect("should press");
        assert_eq!(press.kind, KeyEventKind::Press);
        assert!(!press.repeat);

        let repeat = key_event(&mut keyboard, Key::KEY_J, 2).expect("should repeat");
        assert!(repeat.repeat);

        let release = key_event(&mut keyboard, Key::KEY_J, 0).expect("should release");
        assert_eq!(release.kind, KeyEventKind::Release);

        assert!(key_event(&mut keyboard, Key::KEY_J, 7).is_none());
        assert!(key_event(&mut keyboard, Key::KEY_MUTE, 1).is_none());
    }

    #[test]
    fn test_right_ctrl_fires_mod_binding() {
        let config = parse_config_str(r#"hotkey "Mod+S" action="save""#).expect("should parse");
        let runtime = HotkeyRuntime::new().with_platform(Platform::Linux);
        let bindings = Bindings::load(&config, runtime).expect("should load");
        let mut keyboard = KeyboardState::new();

        for (key, value) in [(Key::KEY_RIGHTCTRL, 1), (Key::KEY_S, 1), (Key::KEY_S, 0)] {
            let event = key_event(&mut keyboard, key, value).expect("should translate");
            bindings.dispatch(&event);
        }

        let fired = bindings.take_fired();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].action, "save");
    }
}

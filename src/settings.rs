//! Visibility persistence in the host's line-oriented settings file.
//!
//! Each window contributes one section:
//!
//! ```text
//! [VizLogData][Window name]
//! Visible=1
//! ```
//!
//! Unparseable lines are a configuration-class error: logged and skipped,
//! leaving the affected window at its default.

use tracing::warn;

use crate::registry::WindowRegistry;

pub const TYPE_TAG: &str = "VizLogData";

/// Serialize every known window's visibility flag, in creation order.
pub fn serialize(registry: &WindowRegistry) -> String {
    let mut out = String::with_capacity(registry.len() * 32);
    for &key in registry.creation_order() {
        let record = registry.get(key).expect("creation order holds live keys");
        out.push_str(&format!(
            "[{TYPE_TAG}][{}]\nVisible={}\n\n",
            record.shared.name(),
            u8::from(record.shared.is_visible())
        ));
    }
    out
}

/// Apply persisted flags. Windows named in the text are created on demand
/// so properties read before any producer touches them are not lost.
/// Does not mark the settings state dirty.
pub fn load(registry: &mut WindowRegistry, text: &str) {
    let header_prefix = format!("[{TYPE_TAG}][");
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(&header_prefix) {
            match rest.strip_suffix(']') {
                Some(name) => current = Some(name.to_owned()),
                None => {
                    warn!("malformed settings header {line:?}");
                    current = None;
                }
            }
            continue;
        }
        if line.starts_with('[') {
            // Some other handler's section; not ours to parse.
            current = None;
            continue;
        }
        let Some(window) = &current else { continue };
        match line.strip_prefix("Visible=").map(str::parse::<u8>) {
            Some(Ok(flag @ (0 | 1))) => {
                registry.restore_visibility(window, flag == 1);
            }
            _ => warn!("ignoring unparseable settings line {line:?} for window {window:?}"),
        }
    }
}

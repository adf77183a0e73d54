use serde::{Deserialize, Serialize};

use crate::structs::model::{Violation, ViolationKind};

/// Raw environment signals forwarded by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    VisibilityHidden,
    VisibilityVisible,
    FocusLost,
    Copy,
    Paste,
    KeyDown(KeyPress),
    ContextMenu,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyPress {
    /// Ctrl/Cmd + c, v or x. Cut counts as copy.
    pub fn clipboard_shortcut(&self) -> Option<ViolationKind> {
        if !(self.ctrl || self.meta) {
            return None;
        }
        match self.key.as_str() {
            "c" | "x" => Some(ViolationKind::Copy),
            "v" => Some(ViolationKind::Paste),
            _ => None,
        }
    }

    pub fn is_devtools(&self) -> bool {
        self.key == "F12" || (self.ctrl && self.shift && self.key == "I")
    }
}

impl Signal {
    /// Whether the client must cancel the native action behind this signal.
    pub fn suppressed(&self) -> bool {
        match self {
            Signal::Copy | Signal::Paste | Signal::ContextMenu => true,
            Signal::KeyDown(key) => key.clipboard_shortcut().is_some() || key.is_devtools(),
            Signal::VisibilityHidden | Signal::VisibilityVisible | Signal::FocusLost => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorStatus {
    pub violation_count: usize,
    pub is_foreground: bool,
}

/// Turns signals into violations for one question screen.
///
/// Every detected event is logged once, in arrival order. Nothing is deduplicated,
/// so a shortcut that also raises the native clipboard event counts twice.
#[derive(Debug)]
pub struct ViolationDetector {
    violations: Vec<Violation>,
    foreground: bool,
}

impl Default for ViolationDetector {
    fn default() -> Self {
        ViolationDetector::new(true)
    }
}

impl ViolationDetector {
    pub fn new(foreground: bool) -> Self {
        ViolationDetector { violations: Vec::new(), foreground }
    }

    pub fn observe(&mut self, signal: &Signal) -> Option<Violation> {
        let violation = match signal {
            Signal::VisibilityHidden => {
                self.foreground = false;
                Violation::new(ViolationKind::TabChange, "User switched to another tab")
            }
            Signal::VisibilityVisible => {
                self.foreground = true;
                return None;
            }
            Signal::FocusLost => Violation::new(ViolationKind::FocusLoss, "Browser window lost focus"),
            Signal::Copy => Violation::new(ViolationKind::Copy, "Attempted to copy content"),
            Signal::Paste => Violation::new(ViolationKind::Paste, "Attempted to paste content"),
            Signal::KeyDown(key) => {
                let kind = key.clipboard_shortcut()?;
                Violation::new(kind, format!("Keyboard shortcut: Ctrl+{}", key.key.to_uppercase()))
            }
            Signal::ContextMenu => return None,
        };
        self.violations.push(violation.clone());
        Some(violation)
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    pub fn status(&self) -> DetectorStatus {
        DetectorStatus {
            violation_count: self.violation_count(),
            is_foreground: self.foreground,
        }
    }

    /// Binds the detector to a question screen. Every violation found while
    /// attached is handed to `on_violation` before `deliver` returns.
    pub fn attach(self, on_violation: impl Fn(Violation) + Send + 'static) -> Subscription {
        Subscription {
            detector: self,
            on_violation: Box::new(on_violation),
        }
    }
}

pub struct Subscription {
    detector: ViolationDetector,
    on_violation: Box<dyn Fn(Violation) + Send>,
}

impl Subscription {
    /// Observes one signal. Returns whether it produced a violation.
    pub fn deliver(&mut self, signal: &Signal) -> bool {
        match self.detector.observe(signal) {
            Some(violation) => {
                log::debug!("Detected {} violation: {}", violation.kind, violation.details);
                (self.on_violation)(violation);
                true
            }
            None => false,
        }
    }

    pub fn status(&self) -> DetectorStatus {
        self.detector.status()
    }

    /// Detaches from the screen, handing back the detector with its final state.
    pub fn cancel(self) -> ViolationDetector {
        self.detector
    }
}

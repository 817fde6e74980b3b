//! Pointer scripts: one JSON event per line, replayed against a [`Surface`].
//!
//! ```text
//! {"type": "pointer_down", "x": 150, "y": 150, "target": {"kind": "body", "id": "a"}}
//! {"type": "pointer_move", "x": 600, "y": 150}
//! {"type": "pointer_up"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use std::io::BufRead;

use serde::Deserialize;
use stickyboard::doc::NoteStore;
use stickyboard::engine::Action;
use stickyboard::geometry::{Point, Rect};
use stickyboard::input::{Key, PointerTarget, ResizeHandle};
use stickyboard::surface::{FixedLayout, Surface};
use stickyboard::sync::RemoteSync;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown resize handle `{0}`")]
    UnknownHandle(String),
}

/// One scripted input event. Coordinates are client-space pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        target: TargetSpec,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp,
    PointerLeave,
    Click {
        x: f64,
        y: f64,
    },
    KeyDown {
        key: String,
    },
    TogglePlacing,
    /// Move or unmount the surface.
    SetSurface {
        rect: Option<Rect>,
    },
    /// Move or remove the drop target.
    SetTrash {
        rect: Option<Rect>,
    },
}

/// What a scripted pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetSpec {
    #[default]
    Surface,
    Body {
        id: String,
        #[serde(default)]
        draft: Option<String>,
    },
    Text {
        id: String,
    },
    Delete {
        id: String,
    },
    Handle {
        id: String,
        #[serde(default = "default_handle")]
        handle: String,
    },
}

fn default_handle() -> String {
    "bottom-right".to_owned()
}

impl TargetSpec {
    /// # Errors
    /// Returns [`ReplayError::UnknownHandle`] for an unrecognized handle name.
    pub fn resolve(self) -> Result<PointerTarget, ReplayError> {
        Ok(match self {
            Self::Surface => PointerTarget::Surface,
            Self::Body { id, draft } => PointerTarget::NoteBody { id, draft_text: draft },
            Self::Text { id } => PointerTarget::NoteText { id },
            Self::Delete { id } => PointerTarget::NoteDelete { id },
            Self::Handle { id, handle } => {
                let Some(handle) = ResizeHandle::from_attr(&handle) else {
                    return Err(ReplayError::UnknownHandle(handle));
                };
                PointerTarget::ResizeHandle { id, handle }
            }
        })
    }
}

/// Parse a JSON-lines script.
///
/// # Errors
/// Returns the first read failure or malformed line, with its 1-based number.
pub fn parse_script(reader: impl BufRead) -> Result<Vec<ReplayEvent>, ReplayError> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(trimmed).map_err(|source| ReplayError::Json { line: idx + 1, source })?;
        events.push(event);
    }
    Ok(events)
}

/// Feed one event to `surface`.
///
/// # Errors
/// Returns an error only when a pointer-down target cannot be resolved.
pub fn apply<S, R>(surface: &mut Surface<FixedLayout, S, R>, event: ReplayEvent) -> Result<Vec<Action>, ReplayError>
where
    S: NoteStore,
    R: RemoteSync,
{
    let actions = match event {
        ReplayEvent::PointerDown { x, y, target } => surface.on_pointer_down(Point::new(x, y), &target.resolve()?),
        ReplayEvent::PointerMove { x, y } => surface.on_pointer_move(Point::new(x, y)),
        ReplayEvent::PointerUp => surface.on_pointer_up(),
        ReplayEvent::PointerLeave => surface.on_pointer_leave(),
        ReplayEvent::Click { x, y } => surface.on_click(Point::new(x, y)),
        ReplayEvent::KeyDown { key } => surface.on_key_down(&Key(key)),
        ReplayEvent::TogglePlacing => {
            surface.core.toggle_placing();
            Vec::new()
        }
        ReplayEvent::SetSurface { rect } => {
            surface.layout_mut().surface = rect;
            Vec::new()
        }
        ReplayEvent::SetTrash { rect } => {
            surface.layout_mut().drop_target = rect;
            Vec::new()
        }
    };
    Ok(actions)
}

/// Parse `WxH` (origin at 0,0) or `x,y,w,h`.
///
/// # Errors
/// Returns a message naming the malformed input.
pub fn parse_rect(raw: &str) -> Result<Rect, String> {
    let bad = || format!("expected WxH or x,y,w,h, got `{raw}`");
    let with_origin = raw.contains(',');
    let sep = if with_origin { ',' } else { 'x' };
    let parts: Vec<f64> =
        raw.split(sep).map(|p| p.trim().parse::<f64>()).collect::<Result<_, _>>().map_err(|_| bad())?;
    match (with_origin, parts.as_slice()) {
        (false, [w, h]) => Ok(Rect::new(0.0, 0.0, *w, *h)),
        (true, [x, y, w, h]) => Ok(Rect::new(*x, *y, *w, *h)),
        _ => Err(bad()),
    }
}

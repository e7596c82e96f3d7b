use log::debug;

use crate::board::BoardState;
use crate::error::{BoardError, Result};
use crate::state::{Connection, ConnectionId, Point};
use crate::viewport::{zoom_factor_for_wheel, Viewport};

/// `MouseEvent.button` decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other,
}

impl PointerButton {
    pub fn from_code(code: i16) -> Self {
        match code {
            0 => Self::Primary,
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Other,
        }
    }
}

/// What the pointer is currently doing. `grab` and `pointer` are in board
/// space; `last` is in screen space since panning moves the board itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    DraggingNode {
        name: String,
        grab: Point,
        pointer: Point,
    },
    Panning {
        last: Point,
    },
}

/// Screen-space segment from the first selected pin to the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewLine {
    pub start: Point,
    pub end: Point,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum LinkMode {
    #[default]
    Off,
    Arming,
    Pending {
        first: String,
        preview: PreviewLine,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinOutcome {
    Ignored,
    FirstSelected,
    Connected(ConnectionId),
}

/// Screen position of a node's pin center.
pub fn pin_anchor(board: &BoardState, name: &str) -> Option<Point> {
    let node = board.registry.get(name)?;
    let pin = node.pin_rect(board.registry.node_size());
    Some(
        board
            .viewport
            .board_to_screen(Point::new(pin.x + pin.width / 2.0, pin.y + pin.height / 2.0)),
    )
}

/// Ephemeral input state. Pointer gestures and connection mode are
/// independent: a node can be dragged while a connection is pending.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
    gesture: Gesture,
    link: LinkMode,
    selected_connection: Option<ConnectionId>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn link_mode(&self) -> &LinkMode {
        &self.link
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    // --- dragging ---

    pub fn begin_drag(&mut self, board: &BoardState, name: &str, pointer: Point) -> bool {
        let Some(node) = board.registry.get(name) else {
            return false;
        };
        self.gesture = Gesture::DraggingNode {
            name: name.to_string(),
            grab: pointer.minus(node.position()),
            pointer,
        };
        true
    }

    pub fn drag_to(&mut self, pointer: Point) -> bool {
        match &mut self.gesture {
            Gesture::DraggingNode { pointer: current, .. } => {
                *current = pointer;
                true
            }
            _ => false,
        }
    }

    /// Where a node should be drawn right now: the live drag position for
    /// the dragged node, otherwise its committed position.
    pub fn display_position(&self, board: &BoardState, name: &str) -> Option<Point> {
        match &self.gesture {
            Gesture::DraggingNode { name: dragged, grab, pointer } if dragged == name => {
                Some(pointer.minus(*grab))
            }
            _ => board.registry.get(name).map(|n| n.position()),
        }
    }

    /// Ends the current gesture. A drag commits the clamped drop position.
    pub fn release(&mut self, board: &mut BoardState) -> Option<(String, Point)> {
        match std::mem::take(&mut self.gesture) {
            Gesture::DraggingNode { name, grab, pointer } => {
                let size = board.board_size();
                let pos = board.registry.move_to(&name, pointer.minus(grab), size)?;
                debug!("dropped {} at ({:.1}, {:.1})", name, pos.x, pos.y);
                Some((name, pos))
            }
            Gesture::Panning { .. } | Gesture::Idle => None,
        }
    }

    // --- panning and zoom ---

    /// Middle button, or primary with Ctrl/Meta, starts a pan.
    pub fn begin_pan(&mut self, button: PointerButton, modifier: bool, pointer: Point) -> bool {
        let pans = button == PointerButton::Middle || (button == PointerButton::Primary && modifier);
        if pans {
            self.gesture = Gesture::Panning { last: pointer };
        }
        pans
    }

    pub fn pan_to(&mut self, pointer: Point, viewport: &mut Viewport) -> bool {
        match &mut self.gesture {
            Gesture::Panning { last } => {
                viewport.pan_by(pointer.x - last.x, pointer.y - last.y);
                *last = pointer;
                true
            }
            _ => false,
        }
    }

    pub fn wheel(&self, viewport: &mut Viewport, delta_y: f64, modifier: bool) -> bool {
        match zoom_factor_for_wheel(delta_y, modifier) {
            Some(factor) => {
                viewport.apply_zoom_delta(factor);
                true
            }
            None => false,
        }
    }

    // --- pin-to-pin connections ---

    pub fn arm_connection(&mut self, board: &BoardState) -> Result<()> {
        if !board.has_main() {
            return Err(BoardError::NoMainScript);
        }
        self.link = LinkMode::Arming;
        Ok(())
    }

    pub fn is_connecting(&self) -> bool {
        self.link != LinkMode::Off
    }

    pub fn pin_selected(&self, name: &str) -> bool {
        matches!(&self.link, LinkMode::Pending { first, .. } if first == name)
    }

    pub fn preview(&self) -> Option<PreviewLine> {
        match &self.link {
            LinkMode::Pending { preview, .. } => Some(*preview),
            _ => None,
        }
    }

    /// First pin arms the preview, a different second pin creates the
    /// connection (first -> second) and leaves connection mode.
    pub fn pin_click(&mut self, board: &mut BoardState, name: &str) -> PinOutcome {
        match std::mem::take(&mut self.link) {
            LinkMode::Off => PinOutcome::Ignored,
            LinkMode::Arming => {
                let Some(anchor) = pin_anchor(board, name) else {
                    self.link = LinkMode::Arming;
                    return PinOutcome::Ignored;
                };
                self.link = LinkMode::Pending {
                    first: name.to_string(),
                    preview: PreviewLine { start: anchor, end: anchor },
                };
                PinOutcome::FirstSelected
            }
            LinkMode::Pending { first, preview } if first == name => {
                self.link = LinkMode::Pending { first, preview };
                PinOutcome::Ignored
            }
            LinkMode::Pending { first, .. } => match board.connect_manual(&first, name) {
                Some(id) => PinOutcome::Connected(id),
                None => PinOutcome::Ignored,
            },
        }
    }

    pub fn track_pointer(&mut self, pointer: Point) -> bool {
        match &mut self.link {
            LinkMode::Pending { preview, .. } => {
                preview.end = pointer;
                true
            }
            _ => false,
        }
    }

    pub fn cancel_connection(&mut self) {
        self.link = LinkMode::Off;
    }

    // --- connection selection ---

    pub fn selected_connection(&self) -> Option<ConnectionId> {
        self.selected_connection
    }

    pub fn select_connection(&mut self, id: Option<ConnectionId>) {
        self.selected_connection = id;
    }

    pub fn delete_selected(&mut self, board: &mut BoardState) -> Option<Connection> {
        let id = self.selected_connection.take()?;
        board.remove_connection(id)
    }

    /// Drops references to board state that no longer exists.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

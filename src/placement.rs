//! One-shot drag-to-place gesture: `Idle -> Dragging -> Idle`.

use serde::Serialize;

use crate::{command::BuildChoice, components::Position, error::Declined};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        choice: BuildChoice,
        cursor: Option<Position>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct PlacementGesture {
    state: DragState,
}

impl PlacementGesture {
    pub fn begin(&mut self, choice: BuildChoice) {
        self.state = DragState::Dragging {
            choice,
            cursor: None,
        };
    }

    pub fn drag_to(&mut self, position: Position) -> Result<(), Declined> {
        match &mut self.state {
            DragState::Dragging { cursor, .. } => {
                *cursor = Some(position);
                Ok(())
            }
            DragState::Idle => Err(Declined::NotDragging),
        }
    }

    /// Ends the gesture and hands back what to build where. The gesture is idle
    /// afterwards; call [`PlacementGesture::rearm`] to let the player try again.
    pub fn release(&mut self) -> Result<(BuildChoice, Position), Declined> {
        match self.state {
            DragState::Dragging {
                choice,
                cursor: Some(position),
            } => {
                self.state = DragState::Idle;
                Ok((choice, position))
            }
            DragState::Dragging { cursor: None, .. } => Err(Declined::NoDropTarget),
            DragState::Idle => Err(Declined::NotDragging),
        }
    }

    pub fn rearm(&mut self, choice: BuildChoice) {
        self.begin(choice);
    }

    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn state(&self) -> DragState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_then_release_yields_target() {
        let mut gesture = PlacementGesture::default();
        assert_eq!(gesture.drag_to(Position::new(1, 1)), Err(Declined::NotDragging));

        gesture.begin(BuildChoice::House);
        assert_eq!(gesture.release(), Err(Declined::NoDropTarget));
        assert!(gesture.is_dragging(), "still armed without a cursor");
        gesture.drag_to(Position::new(40, 60)).unwrap();
        gesture.drag_to(Position::new(45, 65)).unwrap();
        assert_eq!(
            gesture.release(),
            Ok((BuildChoice::House, Position::new(45, 65)))
        );
        assert_eq!(gesture.state(), DragState::Idle);
        assert_eq!(gesture.release(), Err(Declined::NotDragging));
    }

    #[test]
    fn cancel_reports_whether_anything_was_armed() {
        let mut gesture = PlacementGesture::default();
        assert!(!gesture.cancel());
        gesture.begin(BuildChoice::Pump);
        assert!(gesture.cancel());
        assert!(!gesture.is_dragging());
    }
}

//! Planned path and step index of a trip.

use std::fmt;

use crate::store::NodeId;

/// Next spoken direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction {
    /// Walk forward a fixed step, in meters
    Continue { distance: f32 },
    DestinationReached,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Continue { distance } => {
                write!(f, "Continue forward {:.1} meters", distance)
            }
            Instruction::DestinationReached => f.write_str("Destination reached"),
        }
    }
}

/// Follows a planned path one step at a time.
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    path: Vec<NodeId>,
    step: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the path and restart at its first node.
    pub fn set_path(&mut self, path: Vec<NodeId>) {
        self.path = path;
        self.step = 0;
    }

    pub fn clear(&mut self) {
        self.path.clear();
        self.step = 0;
    }

    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Node the user should currently be at.
    pub fn current_node(&self) -> Option<NodeId> {
        self.path.get(self.step).copied()
    }

    /// Move one step along the path, never past its last node.
    pub fn advance(&mut self) {
        if self.step + 1 < self.path.len() {
            self.step += 1;
        }
    }

    /// Instruction for the current step. `None` without a path.
    pub fn instruction(&self, step_distance: f32) -> Option<Instruction> {
        if self.path.is_empty() {
            return None;
        }
        if self.step + 1 >= self.path.len() {
            Some(Instruction::DestinationReached)
        } else {
            Some(Instruction::Continue {
                distance: step_distance,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_path_no_instruction() {
        let nav = Navigator::new();
        assert_eq!(nav.instruction(0.7), None);
        assert_eq!(nav.current_node(), None);
    }

    #[test]
    fn test_walks_to_destination() {
        let mut nav = Navigator::new();
        nav.set_path(vec![1, 2, 3]);
        assert_eq!(nav.instruction(0.7), Some(Instruction::Continue { distance: 0.7 }));
        nav.advance();
        assert_eq!(nav.current_node(), Some(2));
        nav.advance();
        assert_eq!(nav.instruction(0.7), Some(Instruction::DestinationReached));
        // Capped at the last node
        nav.advance();
        assert_eq!(nav.step(), 2);
    }

    #[test]
    fn test_single_node_path_is_already_there() {
        let mut nav = Navigator::new();
        nav.set_path(vec![5]);
        assert_eq!(nav.instruction(0.7), Some(Instruction::DestinationReached));
    }

    #[test]
    fn test_instruction_text() {
        assert_eq!(
            Instruction::Continue { distance: 0.7 }.to_string(),
            "Continue forward 0.7 meters"
        );
        assert_eq!(Instruction::DestinationReached.to_string(), "Destination reached");
    }

    #[test]
    fn test_instruction_distance_has_one_decimal() {
        assert_eq!(
            Instruction::Continue { distance: 1.0 }.to_string(),
            "Continue forward 1.0 meters"
        );
        assert_eq!(
            Instruction::Continue { distance: 0.72 }.to_string(),
            "Continue forward 0.7 meters"
        );
    }

    #[test]
    fn test_set_path_resets_step() {
        let mut nav = Navigator::new();
        nav.set_path(vec![1, 2, 3]);
        nav.advance();
        nav.set_path(vec![4, 5]);
        assert_eq!(nav.step(), 0);
        nav.clear();
        assert!(!nav.has_path());
    }

    proptest! {
        #[test]
        fn prop_only_last_step_reaches_destination(len in 1usize..50, steps in 0usize..60) {
            let mut nav = Navigator::new();
            nav.set_path((0..len as NodeId).collect());
            for _ in 0..steps {
                nav.advance();
            }
            let expected = if nav.step() == len - 1 {
                Instruction::DestinationReached
            } else {
                Instruction::Continue { distance: 0.7 }
            };
            prop_assert_eq!(nav.step(), steps.min(len - 1));
            prop_assert_eq!(nav.instruction(0.7), Some(expected));
        }
    }
}

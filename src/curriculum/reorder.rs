//! In-memory drag-reorder over the organizer's lesson list. Nothing here
//! touches the network; persistence is an explicit separate save.

use uuid::Uuid;

use crate::model::entity::LessonPosition;

use super::{CurriculumError, CurriculumResult};

/// One row of the organizer's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSlot {
    pub id: Uuid,
    pub title: String,
    pub position: i32,
}

impl LessonSlot {
    pub fn new(id: Uuid, title: impl Into<String>, position: i32) -> Self {
        Self {
            id,
            title: title.into(),
            position,
        }
    }
}

/// Relocate the slot at `source` to `target` with remove-then-insert
/// semantics (not a swap): everything between the two indices shifts by
/// one. Positions are renumbered densely afterwards.
///
/// `source == target` is a strict no-op: no shift, no renumbering.
pub fn move_slot(slots: &mut Vec<LessonSlot>, source: usize, target: usize) -> CurriculumResult<()> {
    let len = slots.len();
    if source >= len {
        return Err(CurriculumError::IndexOutOfBounds { index: source, len });
    }
    if target >= len {
        return Err(CurriculumError::IndexOutOfBounds { index: target, len });
    }
    if source == target {
        return Ok(());
    }

    let moved = slots.remove(source);
    slots.insert(target, moved);
    renumber(slots);
    Ok(())
}

/// Assign `1 + index` to every slot, restoring the dense 1..N invariant.
pub fn renumber(slots: &mut [LessonSlot]) {
    for (idx, slot) in slots.iter_mut().enumerate() {
        slot.position = idx as i32 + 1;
    }
}

/// The `{id, position}` list the bulk save sends, one entry per slot.
pub fn as_positions(slots: &[LessonSlot]) -> Vec<LessonPosition> {
    slots
        .iter()
        .map(|slot| LessonPosition {
            id: slot.id,
            position: slot.position,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn slots(titles: &[&str]) -> Vec<LessonSlot> {
        titles
            .iter()
            .enumerate()
            .map(|(idx, title)| LessonSlot::new(Uuid::new_v4(), *title, idx as i32 + 1))
            .collect()
    }

    fn titles(slots: &[LessonSlot]) -> Vec<&str> {
        slots.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn move_down_shifts_between() {
        let mut list = slots(&["a", "b", "c", "d"]);
        move_slot(&mut list, 0, 2).unwrap();
        assert_eq!(titles(&list), ["b", "c", "a", "d"]);
        assert_eq!(
            list.iter().map(|s| s.position).collect::<Vec<_>>(),
            [1, 2, 3, 4]
        );
    }

    #[test]
    fn move_up_shifts_between() {
        let mut list = slots(&["a", "b", "c", "d"]);
        move_slot(&mut list, 3, 1).unwrap();
        assert_eq!(titles(&list), ["a", "d", "b", "c"]);
    }

    #[test]
    fn same_slot_is_noop() {
        let mut list = slots(&["a", "b", "c"]);
        // scramble the stored positions to prove nothing gets renumbered
        list[1].position = 42;
        let before = list.clone();
        move_slot(&mut list, 1, 1).unwrap();
        assert_eq!(list, before);
    }

    #[test]
    fn all_pairs_keep_invariants() {
        let original = slots(&["a", "b", "c", "d", "e"]);
        for source in 0..original.len() {
            for target in 0..original.len() {
                if source == target {
                    continue;
                }
                let mut list = original.clone();
                move_slot(&mut list, source, target).unwrap();

                // moved entry lands exactly at target
                assert_eq!(list[target].id, original[source].id);
                // everyone else keeps their relative order
                let rest: Vec<_> = list.iter().filter(|s| s.id != original[source].id).collect();
                let expected: Vec<_> = original
                    .iter()
                    .filter(|s| s.id != original[source].id)
                    .collect();
                assert_eq!(
                    rest.iter().map(|s| s.id).collect::<Vec<_>>(),
                    expected.iter().map(|s| s.id).collect::<Vec<_>>()
                );
                // positions stay a dense 1..N sequence
                assert_eq!(
                    list.iter().map(|s| s.position).collect::<Vec<_>>(),
                    (1..=original.len() as i32).collect::<Vec<_>>()
                );
            }
        }
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut list = slots(&["a", "b"]);
        assert!(matches!(
            move_slot(&mut list, 5, 0),
            Err(CurriculumError::IndexOutOfBounds { index: 5, len: 2 })
        ));
        assert!(matches!(
            move_slot(&mut list, 0, 2),
            Err(CurriculumError::IndexOutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn positions_payload_mirrors_order() {
        let mut list = slots(&["a", "b", "c"]);
        move_slot(&mut list, 2, 0).unwrap();
        let payload = as_positions(&list);
        assert_eq!(payload.len(), 3);
        assert_eq!(payload[0].id, list[0].id);
        assert_eq!(payload[0].position, 1);
        assert_eq!(payload[2].position, 3);
    }
}

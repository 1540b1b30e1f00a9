//! Collapse of a class layer stack into one label image.

use rayon::prelude::*;

use super::layer::{ClassLayerStack, CompositeMask};
use crate::annotation::{ClassId, ClassPriority};

/// Reduces `stack` to a single label per pixel.
///
/// Classes are visited in ascending id order. A pixel claimed by a class
/// takes that class if it is still background or currently holds a class of
/// strictly worse rank; among equal ranks the earlier (lower) id stays.
/// Every non-zero output pixel therefore carries the best-ranked class
/// claiming it. Rows are reduced in parallel; the result does not depend on
/// scheduling.
pub fn composite(stack: &ClassLayerStack, priority: &ClassPriority) -> CompositeMask {
    let (height, width) = (stack.height(), stack.width());
    let mut labels = vec![0u8; height * width];
    if height == 0 || width == 0 {
        return CompositeMask::from_labels(height, width, labels);
    }

    let claimed: Vec<(ClassId, u32)> = (0..stack.layers())
        .map(|id| ClassId(id as u8))
        .filter(|&class| stack.is_claimed(class))
        .map(|class| (class, priority.rank(class)))
        .collect();

    labels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out)| {
            for &(class, rank) in &claimed {
                let claims = stack.layer_row(class, row);
                for (label, &claim) in out.iter_mut().zip(claims) {
                    if claim == 0 {
                        continue;
                    }
                    if *label == 0 || priority.rank(ClassId(*label)) > rank {
                        *label = class.as_u8();
                    }
                }
            }
        });

    CompositeMask::from_labels(height, width, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::ClassTable;
    use crate::raster::layer::Patch;

    fn table() -> ClassTable {
        ClassTable::new([("background", 0), ("a", 1), ("b", 2), ("c", 3)]).unwrap()
    }

    fn full_patch(class: u8, height: usize, width: usize) -> Patch {
        let mut patch = Patch::new(ClassId(class), 0, 0, height, width);
        for row in 0..height {
            for col in 0..width {
                patch.mark(row, col);
            }
        }
        patch
    }

    #[test]
    fn test_empty_stack_is_background() {
        let priority = ClassPriority::from_names(&table(), &["a"]).unwrap();
        let mask = composite(&ClassLayerStack::new(4, 3, 5), &priority);
        assert!(mask.is_background());
        assert_eq!((mask.height(), mask.width()), (3, 5));
    }

    #[test]
    fn test_higher_priority_wins_over_lower_id() {
        // c (id 3) ranks above a (id 1) even though a is visited first.
        let priority = ClassPriority::from_names(&table(), &["c", "a"]).unwrap();
        let mut stack = ClassLayerStack::new(4, 2, 2);
        stack.merge_patch(&full_patch(1, 2, 2));
        let mut corner = Patch::new(ClassId(3), 0, 0, 1, 1);
        corner.mark(0, 0);
        stack.merge_patch(&corner);

        let mask = composite(&stack, &priority);
        assert_eq!(mask.as_slice(), &[3, 1, 1, 1]);
    }

    #[test]
    fn test_unlisted_class_loses_to_listed() {
        let priority = ClassPriority::from_names(&table(), &["b"]).unwrap();
        let mut stack = ClassLayerStack::new(4, 1, 2);
        stack.merge_patch(&full_patch(1, 1, 2));
        stack.merge_patch(&full_patch(2, 1, 1));

        let mask = composite(&stack, &priority);
        assert_eq!(mask.as_slice(), &[2, 1]);
    }

    #[test]
    fn test_equal_rank_keeps_first_writer() {
        // Neither a nor c is listed: both share the lowest rank.
        let priority = ClassPriority::from_names(&table(), &["b"]).unwrap();
        let mut stack = ClassLayerStack::new(4, 1, 1);
        stack.merge_patch(&full_patch(3, 1, 1));
        stack.merge_patch(&full_patch(1, 1, 1));

        let mask = composite(&stack, &priority);
        assert_eq!(mask.as_slice(), &[1]);
    }
}

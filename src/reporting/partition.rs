use std::iter::FusedIterator;

/// Yield pairs of lists with all possible subsets of `items`.
///
/// Each pattern `n` in `0..2^len - 1` is read most-significant bit first, one
/// bit per item: items with a set bit go to the first list, the rest to the
/// second. Both lists keep the input order. The all-ones pattern, which
/// would put every item in the first list, is not produced.
///
/// # Panics
///
/// If `items` has as many elements as `usize` has bits.
pub fn combo_partition<T: Clone>(items: &[T]) -> ComboPartition<'_, T> {
    assert!(
        items.len() < usize::BITS as usize,
        "cannot partition {} items",
        items.len()
    );
    ComboPartition {
        items,
        next: 0,
        end: (1usize << items.len()) - 1,
    }
}

/// Iterator returned by [`combo_partition`].
#[derive(Debug, Clone)]
pub struct ComboPartition<'a, T> {
    items: &'a [T],
    next: usize,
    end: usize,
}

impl<T: Clone> Iterator for ComboPartition<'_, T> {
    type Item = (Vec<T>, Vec<T>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let pattern = self.next;
        self.next += 1;

        let width = self.items.len();
        let mut selected = Vec::new();
        let mut rest = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            if pattern >> (width - 1 - i) & 1 == 1 {
                selected.push(item.clone());
            } else {
                rest.push(item.clone());
            }
        }
        Some((selected, rest))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for ComboPartition<'_, T> {}

impl<T: Clone> FusedIterator for ComboPartition<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_nothing() {
        let items: [&str; 0] = [];
        assert_eq!(combo_partition(&items).count(), 0);
    }

    #[test]
    fn single_item() {
        let parts: Vec<_> = combo_partition(&["a"]).collect();
        assert_eq!(parts, vec![(vec![], vec!["a"])]);
    }

    #[test]
    fn three_items_in_pattern_order() {
        let parts: Vec<_> = combo_partition(&['a', 'b', 'c']).collect();
        assert_eq!(
            parts,
            vec![
                (vec![], vec!['a', 'b', 'c']),
                (vec!['c'], vec!['a', 'b']),
                (vec!['b'], vec!['a', 'c']),
                (vec!['b', 'c'], vec!['a']),
                (vec!['a'], vec!['b', 'c']),
                (vec!['a', 'c'], vec!['b']),
                (vec!['a', 'b'], vec!['c']),
            ]
        );
    }

    #[test]
    fn five_items_are_fully_partitioned() {
        let items = [1, 2, 3, 4, 5];
        let parts = combo_partition(&items);
        assert_eq!(parts.len(), 31);
        for (a, b) in parts {
            assert_eq!(a.len() + b.len(), items.len());
            let mut all = [a, b].concat();
            all.sort();
            assert_eq!(all, items);
        }
    }

    #[test]
    fn restarts_on_each_call() {
        let items = ["x", "y"];
        let first: Vec<_> = combo_partition(&items).collect();
        let second: Vec<_> = combo_partition(&items).collect();
        assert_eq!(first, second);
    }
}

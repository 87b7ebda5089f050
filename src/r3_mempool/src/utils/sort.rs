/// Sort the specified slice using the specified comparator.
///
/// This sort is stable. It's an insertion sort, which is fine for the
/// handful of elements it's used for and doesn't need a scratch buffer.
pub(crate) fn slice_sort_stable_by<T>(v: &mut [T], mut is_less: impl FnMut(&T, &T) -> bool) {
    for i in 1..v.len() {
        // Shift `v[i]` to the left past every element it is strictly less
        // than. Stopping at an equal element is what keeps this stable.
        let mut k = i;
        while k > 0 && is_less(&v[k], &v[k - 1]) {
            v.swap(k, k - 1);
            k -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn sort_small() {
        let mut array = [2, 6, 1, 9, 13, 3, 8, 12, 5, 11, 14, 7, 4, 10];
        slice_sort_stable_by(&mut array, |x, y| x < y);
        assert_eq!(array, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
    }

    #[test]
    fn ties_keep_input_order() {
        let mut array = [(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd'), (2, 'e')];
        slice_sort_stable_by(&mut array, |x, y| x.0 < y.0);
        assert_eq!(array, [(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c'), (2, 'e')]);
    }

    #[quickcheck]
    fn sort(values: Vec<(u8, u8)>) {
        let mut got = values.clone();
        let mut expected = values;

        slice_sort_stable_by(&mut got, |x, y| x.0 < y.0);
        expected.sort_by_key(|x| x.0);

        assert_eq!(got, expected);
    }
}

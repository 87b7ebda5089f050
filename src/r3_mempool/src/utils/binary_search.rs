//! Binary search over an implicit ascending sequence
//!
//! `lower_bound!(len, |i| pred)` returns the first index in `0..=len` for
//! which `pred` is false, assuming `pred` holds for a prefix of the sequence
//! and fails for the rest.
macro_rules! lower_bound {
    (
        $len:expr,
        |$i:ident| $pred:expr
    ) => {{
        let mut start = 0usize;
        let mut end: usize = $len;
        while end > start {
            let mid = start + (end - start) / 2;
            let holds = {
                let $i = mid;
                $pred
            };
            if holds {
                start = mid + 1;
            } else {
                end = mid;
            }
        }
        start
    }};
}

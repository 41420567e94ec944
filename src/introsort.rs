//! In-place introspective sort for the small key arrays the engine produces: chain keys
//! drained from the registry and induction candidates. Quicksort with median-of-three pivots,
//! insertion sort for short ranges and a heapsort fallback once the recursion gets too deep.

const INSERTION_THRESHOLD: usize = 16;

/// Sorts `v` in ascending order. Not stable.
pub fn introsort<T: Ord + Copy>(v: &mut [T]) {
    if v.len() < 2 {
        return;
    }
    let depth_limit = 2 * (usize::BITS - v.len().leading_zeros());
    quicksort(v, depth_limit);
}

fn quicksort<T: Ord + Copy>(mut v: &mut [T], mut depth_limit: u32) {
    loop {
        let len = v.len();
        if len <= INSERTION_THRESHOLD {
            insertion_sort(v);
            return;
        }
        if depth_limit == 0 {
            heapsort(v);
            return;
        }
        depth_limit -= 1;

        let mid = partition(v);
        // Recurse into the smaller half, loop on the larger one.
        let (left, right) = std::mem::take(&mut v).split_at_mut(mid);
        let right = &mut right[1..];
        if left.len() < right.len() {
            quicksort(left, depth_limit);
            v = right;
        } else {
            quicksort(right, depth_limit);
            v = left;
        }
    }
}

/// Lomuto partition around a median-of-three pivot. Returns the pivot's final index.
fn partition<T: Ord + Copy>(v: &mut [T]) -> usize {
    let last = v.len() - 1;
    let mid = v.len() / 2;
    if v[mid] < v[0] {
        v.swap(mid, 0);
    }
    if v[last] < v[0] {
        v.swap(last, 0);
    }
    if v[mid] < v[last] {
        v.swap(mid, last);
    }
    // v[last] now holds the median.
    let pivot = v[last];
    let mut store = 0;
    for i in 0..last {
        if v[i] < pivot {
            v.swap(i, store);
            store += 1;
        }
    }
    v.swap(store, last);
    store
}

fn insertion_sort<T: Ord + Copy>(v: &mut [T]) {
    for i in 1..v.len() {
        let item = v[i];
        let mut j = i;
        while j > 0 && item < v[j - 1] {
            v[j] = v[j - 1];
            j -= 1;
        }
        v[j] = item;
    }
}

fn heapsort<T: Ord + Copy>(v: &mut [T]) {
    let len = v.len();
    for start in (0..len / 2).rev() {
        sift_down(v, start, len);
    }
    for end in (1..len).rev() {
        v.swap(0, end);
        sift_down(v, 0, end);
    }
}

fn sift_down<T: Ord + Copy>(v: &mut [T], mut root: usize, end: usize) {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && v[child] < v[child + 1] {
            child += 1;
        }
        if v[root] >= v[child] {
            return;
        }
        v.swap(root, child);
        root = child;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn sorts_small_and_reversed() {
        let mut v = vec![3u32, 1, 2];
        introsort(&mut v);
        assert_eq!(v, vec![1, 2, 3]);

        let mut v: Vec<u32> = (0..1000).rev().collect();
        introsort(&mut v);
        assert!(v.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn heapsort_alone_sorts() {
        let mut v = vec![9u64, 4, 4, 7, 0, 12, 3, 3, 1];
        heapsort(&mut v);
        assert_eq!(v, vec![0, 1, 3, 3, 4, 4, 7, 9, 12]);
    }

    #[test]
    fn many_duplicates_fall_back_without_blowup() {
        let mut v = vec![5u32; 10_000];
        v[1234] = 1;
        introsort(&mut v);
        assert_eq!(v[0], 1);
        assert!(v[1..].iter().all(|&x| x == 5));
    }

    quickcheck! {
        fn matches_std_sort(v: Vec<(u32, u32)>) -> bool {
            let mut expected = v.clone();
            expected.sort();
            let mut got = v;
            introsort(&mut got);
            got == expected
        }
    }
}

//! Lane masks and the elementwise select primitive.
//!
//! A mask is an `Array1<f32>` with one 0/1 entry per lane. Every per-lane decision in the
//! crate is expressed through `select` so that no caller branches on lane data itself.

use ndarray::{Array, Array1, ArrayView1, RemoveAxis, Zip};

/// Pick, lane by lane, from `if_true` where `mask` is non-zero and from `if_false` elsewhere.
///
/// Lane `i` of the mask only ever controls lane `i` of the output. Values are copied,
/// never blended, so the output is bit-identical to whichever input was chosen. This is the
/// one place where a mask entry turns into a choice of source.
///
/// Panics if the operands differ in shape or if the mask does not cover every lane.
pub fn select<T, D>(mask: ArrayView1<f32>, if_true: &Array<T, D>, if_false: &Array<T, D>) -> Array<T, D>
where
    T: Clone,
    D: RemoveAxis,
{
    assert_eq!(if_true.shape(), if_false.shape(), "select operands must share a shape");
    assert!(if_true.ndim() > 0, "select operands need a lane axis");
    assert_eq!(if_true.shape()[0], mask.len(), "mask must have one entry per lane");

    let mut out = if_false.clone();
    Zip::from(out.outer_iter_mut())
        .and(if_true.outer_iter())
        .and(if_false.outer_iter())
        .and(mask)
        .for_each(|mut lane, on_true, on_false, &m| {
            // every lane is written; the mask only picks the source
            let sources = [on_false, on_true];
            lane.assign(&sources[usize::from(m != 0.0)]);
        });
    out
}

/// `1 - mask`, elementwise.
pub fn complement(mask: ArrayView1<f32>) -> Array1<f32> {
    mask.mapv(|m| 1.0 - m)
}

/// Sum of the mask, i.e. the number of set lanes.
pub fn count(mask: ArrayView1<f32>) -> u64 {
    mask.iter().map(|&m| m as u64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, ArrayD, IxDyn};

    #[test]
    fn select_picks_per_lane() {
        let mask = arr1(&[1.0, 0.0, 1.0]);
        let a = arr2(&[[1.0f32, 1.0], [2.0, 2.0], [3.0, 3.0]]);
        let b = arr2(&[[-1.0f32, -1.0], [-2.0, -2.0], [-3.0, -3.0]]);
        let out = select(mask.view(), &a, &b);
        assert_eq!(out, arr2(&[[1.0, 1.0], [-2.0, -2.0], [3.0, 3.0]]));
    }

    #[test]
    fn select_is_exact_for_non_finite_values() {
        let mask = arr1(&[0.0, 1.0]);
        let a = arr1(&[f32::INFINITY, f32::NEG_INFINITY]);
        let b = arr1(&[f32::NAN, 0.5]);
        let out = select(mask.view(), &a, &b);
        assert!(out[0].is_nan());
        assert_eq!(out[1], f32::NEG_INFINITY);
    }

    #[test]
    fn select_handles_dynamic_rank_and_integers() {
        let mask = arr1(&[0.0, 1.0]);
        let a = ArrayD::<u64>::from_elem(IxDyn(&[2, 2, 3]), 7);
        let b = ArrayD::<u64>::from_elem(IxDyn(&[2, 2, 3]), 9);
        let out = select(mask.view(), &a, &b);
        assert!(out.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 9));
        assert!(out.index_axis(ndarray::Axis(0), 1).iter().all(|&v| v == 7));
    }

    #[test]
    #[should_panic(expected = "one entry per lane")]
    fn select_rejects_short_mask() {
        let mask = arr1(&[1.0]);
        let a = arr1(&[1.0f32, 2.0]);
        let _ = select(mask.view(), &a, &a);
    }

    #[test]
    fn complement_and_count() {
        let mask = arr1(&[1.0, 0.0, 1.0, 1.0]);
        assert_eq!(complement(mask.view()), arr1(&[0.0, 1.0, 0.0, 0.0]));
        assert_eq!(count(mask.view()), 3);
    }
}

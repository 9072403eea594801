//! Property-based tests for binning, the codec round trip, and cropping.
//!
//! Uses proptest to generate randomized indexes and intervals and checks the
//! laws that hold for every input: candidate-bin coverage, load/save
//! stability, and the crop subset/membership/offset guarantees.

use std::collections::BTreeMap;

use bamchop::binning::{candidate_bins, BAI_DEPTH, BAI_MIN_SHIFT, LINEAR_WINDOW_SHIFT};
use bamchop::crop::{crop, CropOptions, GenomicInterval};
use bamchop::index::{BinRecord, Chunk, FormatParams, Index, ReferenceIndex, VirtualOffset};
use proptest::prelude::*;

fn arb_chunk() -> impl Strategy<Value = Chunk> {
    (0u64..1_000_000u64, 0u64..1_000_000u64).prop_map(|(a, b)| {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Chunk::new(VirtualOffset::from_raw(start), VirtualOffset::from_raw(end))
    })
}

fn arb_bin_record() -> impl Strategy<Value = BinRecord> {
    (0u64..1_000_000u64, prop::collection::vec(arb_chunk(), 1..4)).prop_map(
        |(loffset, chunks)| BinRecord {
            loffset: VirtualOffset::from_raw(loffset),
            chunks,
        },
    )
}

/// Bin identifiers drawn from the candidate range of small BAI regions, so
/// generated intervals actually hit generated bins now and then.
fn arb_bins() -> impl Strategy<Value = BTreeMap<u32, BinRecord>> {
    prop::collection::btree_map(
        prop_oneof![Just(0u32), 1u32..9, 9u32..73, 4681u32..4700],
        arb_bin_record(),
        0..6,
    )
}

fn arb_reference(with_linear: bool) -> impl Strategy<Value = ReferenceIndex> {
    let linear = if with_linear {
        prop::collection::vec(0u64..1_000_000u64, 0..6).boxed()
    } else {
        Just(Vec::new()).boxed()
    };
    (arb_bins(), linear).prop_map(|(bins, intervals)| ReferenceIndex {
        bins,
        intervals: intervals.into_iter().map(VirtualOffset::from_raw).collect(),
    })
}

fn arb_bai_index() -> impl Strategy<Value = Index> {
    (
        prop::collection::vec(arb_reference(true), 1..4),
        prop::option::of(0u64..1_000_000u64),
    )
        .prop_map(|(references, unaligned_count)| Index {
            params: FormatParams::Bai,
            references,
            unaligned_count,
        })
}

fn arb_csi_index() -> impl Strategy<Value = Index> {
    (
        12i32..16,
        3i32..6,
        prop::collection::vec(any::<u8>(), 0..8),
        prop::collection::vec(arb_reference(false), 1..4),
        prop::option::of(0u64..1_000_000u64),
    )
        .prop_map(|(min_shift, depth, aux, references, unaligned_count)| Index {
            params: FormatParams::Csi {
                min_shift,
                depth,
                aux,
            },
            references,
            unaligned_count,
        })
}

fn arb_index() -> impl Strategy<Value = Index> {
    prop_oneof![arb_bai_index(), arb_csi_index()]
}

/// An index together with an interval on one of its references.
fn arb_index_and_interval() -> impl Strategy<Value = (Index, GenomicInterval)> {
    arb_index().prop_flat_map(|index| {
        let n_ref = index.references.len();
        (Just(index), 0..n_ref, 0u64..200_000u64, 1u64..100_000u64).prop_map(
            |(index, ref_id, begin, len)| (index, GenomicInterval::new(ref_id, begin, begin + len)),
        )
    })
}

proptest! {
    #[test]
    fn level_zero_bin_always_a_candidate(
        begin in 0u64..500_000_000u64,
        len in 1u64..10_000_000u64,
        min_shift in 10i32..18,
        depth in 0i32..6,
    ) {
        let bins = candidate_bins(begin, begin + len, min_shift, depth);
        prop_assert_eq!(bins[0], 0);
    }

    #[test]
    fn candidate_count_bound_for_point_queries(pos in 0u64..500_000_000u64) {
        // An interval inside one finest-level bin yields one bin per level.
        let bins = candidate_bins(pos, pos + 1, BAI_MIN_SHIFT, BAI_DEPTH);
        prop_assert_eq!(bins.len(), (BAI_DEPTH + 1) as usize);
    }

    #[test]
    fn load_save_round_trip(index in arb_index()) {
        let bytes = index.to_bytes().unwrap();
        let mut cursor = std::io::Cursor::new(bytes.clone());
        let reloaded = Index::read(&mut cursor).unwrap();
        prop_assert_eq!(&reloaded, &index);
        // And the byte image is stable too.
        prop_assert_eq!(reloaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn crop_keeps_only_input_material((index, interval) in arb_index_and_interval()) {
        let cropped = crop(&index, &interval, &CropOptions::default()).unwrap();

        prop_assert_eq!(cropped.references.len(), index.references.len());
        for (ref_id, reference) in cropped.references.iter().enumerate() {
            if ref_id != interval.ref_id {
                prop_assert!(reference.bins.is_empty());
                continue;
            }
            for (bin_id, record) in &reference.bins {
                let input = index.references[ref_id].bins.get(bin_id);
                prop_assert!(input.is_some(), "bin {} not in input", bin_id);
                let input = input.unwrap();
                // Kept chunks appear in the input bin, in order (chunks are
                // never reordered or split).
                let mut cursor = 0;
                for chunk in &record.chunks {
                    let found = input.chunks[cursor..].iter().position(|c| c == chunk);
                    prop_assert!(found.is_some(), "chunk not in input bin {}", bin_id);
                    cursor += found.unwrap() + 1;
                }
                prop_assert!(!record.chunks.is_empty());
            }
        }
    }

    #[test]
    fn csi_crop_bins_are_candidates((index, interval) in arb_csi_index().prop_flat_map(|index| {
        let n_ref = index.references.len();
        (Just(index), 0..n_ref, 0u64..200_000u64, 1u64..100_000u64)
            .prop_map(|(index, ref_id, begin, len)| (index, GenomicInterval::new(ref_id, begin, begin + len)))
    })) {
        let cropped = crop(&index, &interval, &CropOptions::default()).unwrap();
        let candidates = candidate_bins(interval.begin, interval.end, index.min_shift(), index.depth());
        for bin_id in cropped.references[interval.ref_id].bins.keys() {
            prop_assert!(candidates.contains(bin_id), "bin {} is not a candidate", bin_id);
        }
    }

    #[test]
    fn bai_crop_respects_linear_lower_bound((index, interval) in arb_bai_index().prop_flat_map(|index| {
        let n_ref = index.references.len();
        (Just(index), 0..n_ref, 0u64..200_000u64, 1u64..100_000u64)
            .prop_map(|(index, ref_id, begin, len)| (index, GenomicInterval::new(ref_id, begin, begin + len)))
    })) {
        let cropped = crop(&index, &interval, &CropOptions::default()).unwrap();

        let linear = &index.references[interval.ref_id].intervals;
        let window = (interval.begin >> LINEAR_WINDOW_SHIFT) as usize;
        if window < linear.len() {
            let bound = linear[window];
            for record in cropped.references[interval.ref_id].bins.values() {
                for chunk in &record.chunks {
                    prop_assert!(chunk.end >= bound);
                }
            }
        }
    }

    #[test]
    fn cropped_index_round_trips((index, interval) in arb_index_and_interval()) {
        let cropped = crop(&index, &interval, &CropOptions { retain_linear_index: true }).unwrap();
        let bytes = cropped.to_bytes().unwrap();
        let mut cursor = std::io::Cursor::new(bytes);
        let reloaded = Index::read(&mut cursor).unwrap();
        prop_assert_eq!(reloaded, cropped);
    }
}

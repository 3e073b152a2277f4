#![cfg(test)]

// Property tests for ProbeTable kept inside the crate so they can reach the
// table directly and check the probe invariant after every step.

use crate::element::Merge;
use crate::hash_code::BuildIdentityHasher;
use crate::probe_table::{Placement, ProbeTable};
use proptest::prelude::*;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

// Identity is `id`; `code` is a fixed function of `id` chosen by the pool,
// so small code ranges force long clusters.
#[derive(Clone, Debug)]
struct Elem {
    id: usize,
    code: u32,
    weight: u32,
}

impl PartialEq for Elem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Elem {}
impl Hash for Elem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.code);
    }
}
impl Merge for Elem {
    fn merge(&mut self, other: Self) {
        self.weight += other.weight;
    }
}

#[derive(Clone, Debug)]
enum Op {
    Place(usize, u32),
    Take(usize),
    Find(usize),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<u32>, Vec<Op>)> {
    (1usize..=8, proptest::collection::vec(0u32..12, 1..=10)).prop_flat_map(|(cap, pool)| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), 1u32..5).prop_map(|(i, w)| Op::Place(i, w)),
            2 => idx.clone().prop_map(Op::Take),
            2 => idx.prop_map(Op::Find),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (cap, pool.clone(), ops))
    })
}

fn elem(pool: &[u32], id: usize, weight: u32) -> Elem {
    Elem {
        id,
        code: pool[id],
        weight,
    }
}

// Property: state-machine equivalence against a HashMap of summed weights.
// Invariants exercised across random operation sequences:
// - The probe invariant holds after every operation, including growth.
// - Duplicates merge (weights add up) and never change `len`.
// - `take_at` of a found index returns the element and keeps every other
//   element findable (backward shift correctness).
// - Capacity only grows, and `clear` keeps it.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_probe_table_state_machine((cap, pool, ops) in arb_scenario()) {
        let mut sut: ProbeTable<Elem, BuildIdentityHasher> =
            ProbeTable::with_capacity_and_hasher(cap, BuildIdentityHasher);
        let mut model: HashMap<usize, u32> = HashMap::new();
        let mut last_capacity = sut.capacity();

        for op in ops {
            match op {
                Op::Place(id, w) => {
                    let already = model.contains_key(&id);
                    match sut.place(elem(&pool, id, w)) {
                        Placement::Inserted(i) => {
                            prop_assert!(!already, "fresh slot only for absent ids");
                            prop_assert_eq!(sut.get(i).map(|e| e.id), Some(id));
                            model.insert(id, w);
                        }
                        Placement::Merged(i) => {
                            prop_assert!(already, "merge only for present ids");
                            let total = model.get_mut(&id).unwrap();
                            *total += w;
                            prop_assert_eq!(sut.get(i).map(|e| e.weight), Some(*total));
                        }
                    }
                }
                Op::Take(id) => {
                    match sut.find(&elem(&pool, id, 0)) {
                        Some(i) => {
                            let taken = sut.take_at(i).expect("found index is occupied");
                            prop_assert_eq!(taken.id, id);
                            let w = model.remove(&id).expect("present in model");
                            prop_assert_eq!(taken.weight, w);
                        }
                        None => prop_assert!(!model.contains_key(&id)),
                    }
                }
                Op::Find(id) => {
                    let found = sut.find(&elem(&pool, id, 0));
                    prop_assert_eq!(found.is_some(), model.contains_key(&id));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            prop_assert!(sut.probe_invariant_holds());
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.capacity() >= last_capacity);
            last_capacity = sut.capacity();
            for (&id, &w) in &model {
                let i = sut.find(&elem(&pool, id, 0));
                prop_assert!(i.is_some(), "lost element {}", id);
                prop_assert_eq!(sut.get(i.unwrap()).map(|e| e.weight), Some(w));
            }
        }
    }
}

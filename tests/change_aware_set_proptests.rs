// ChangeAwareSet property tests (consolidated).
//
// Property 1: state-machine equivalence against a HashMap model.
//  - Model: id -> (code, weight). Identity is the id; the code is the hash
//    and can be changed through do_change.
//  - Operations: insert (merge adds weights), remove, clear, do_change to a
//    new code, live cursor open/step/close.
//  - Invariant after every step: len, membership and merged weights match
//    the model; listener calls match the number of membership changes.
//  - Live cursors: whenever has_next is true, next succeeds and yields an
//    element that is in the model at that moment.
//
// Property 2: an undisturbed live walk and a strict walk both visit every
// element exactly once, in the same order.
use change_aware_set::hash_code::BuildIdentityHasher;
use change_aware_set::{ChangeAwareSet, LiveIter, Merge};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Clone, Debug)]
struct Item {
    id: usize,
    code: u32,
    weight: u32,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Item {}
impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.code);
    }
}
impl Merge for Item {
    fn merge(&mut self, other: Self) {
        self.weight += other.weight;
    }
}

type Set = ChangeAwareSet<Item, BuildIdentityHasher>;

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, u32, u32),
    Remove(usize),
    Clear,
    Change(usize, u32),
    OpenLive,
    StepLive(usize),
    CloseLive(usize),
}

fn arb_op(ids: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (0..ids, 0u32..24, 1u32..5).prop_map(|(i, c, w)| Op::Insert(i, c, w)),
        2 => (0..ids).prop_map(Op::Remove),
        1 => Just(Op::Clear),
        2 => (0..ids, 0u32..24).prop_map(|(i, c)| Op::Change(i, c)),
        1 => Just(Op::OpenLive),
        4 => (0usize..8).prop_map(Op::StepLive),
        1 => (0usize..8).prop_map(Op::CloseLive),
    ]
}

fn probe(model: &HashMap<usize, (u32, u32)>, id: usize) -> Item {
    let code = model.get(&id).map_or(0, |&(code, _)| code);
    Item { id, code, weight: 0 }
}

// Property 1: model equivalence with listeners and live cursors.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_set_matches_model(
        cap in 1usize..=16,
        ops in (1usize..=10).prop_flat_map(|ids| proptest::collection::vec(arb_op(ids), 1..120)),
    ) {
        let mut sut: Set = ChangeAwareSet::with_capacity_and_hasher(cap, BuildIdentityHasher);
        let mut model: HashMap<usize, (u32, u32)> = HashMap::new();
        let fired = Rc::new(Cell::new(0u32));
        let f = fired.clone();
        sut.add_listener(move || f.set(f.get() + 1));
        let mut expected_fired = 0u32;
        let mut cursors: Vec<LiveIter> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(id, code, weight) => {
                    // A present id keeps its current code; the probe carries it.
                    let code = model.get(&id).map_or(code, |&(c, _)| c);
                    let fresh = sut.insert(Item { id, code, weight });
                    prop_assert_eq!(fresh, !model.contains_key(&id));
                    model.entry(id).or_insert((code, 0)).1 += weight;
                    if fresh {
                        expected_fired += 1;
                    }
                }
                Op::Remove(id) => {
                    let removed = sut.take(&probe(&model, id));
                    prop_assert_eq!(removed.is_some(), model.contains_key(&id));
                    if let Some(item) = removed {
                        let (_, weight) = model.remove(&id).unwrap();
                        prop_assert_eq!(item.weight, weight);
                        expected_fired += 1;
                    }
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    expected_fired += 1;
                    for c in &cursors {
                        prop_assert!(!c.has_next(&sut));
                    }
                }
                Op::Change(id, code) => {
                    let res = sut.do_change(&probe(&model, id), |item| {
                        item.code = code;
                        true
                    });
                    match model.get_mut(&id) {
                        Some(entry) => {
                            prop_assert_eq!(res, Some(true));
                            entry.0 = code;
                            expected_fired += 1;
                        }
                        None => prop_assert_eq!(res, None),
                    }
                }
                Op::OpenLive => cursors.push(sut.live_iter()),
                Op::StepLive(k) => {
                    if let Some(c) = cursors.get(k % cursors.len().max(1)) {
                        if c.has_next(&sut) {
                            let item = c.next(&mut sut);
                            prop_assert!(item.is_ok(), "has_next promised an element");
                            let id = item.unwrap().id;
                            prop_assert!(model.contains_key(&id));
                        } else {
                            prop_assert!(c.next(&mut sut).is_err());
                        }
                    }
                }
                Op::CloseLive(k) => {
                    if !cursors.is_empty() {
                        let c = cursors.swap_remove(k % cursors.len());
                        c.close(&mut sut);
                    }
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(fired.get(), expected_fired);
            prop_assert!(sut.live_iter_count() <= cursors.len());
            for (&id, &(code, weight)) in &model {
                let got = sut.get(&Item { id, code, weight: 0 });
                prop_assert_eq!(got.map(|i| i.weight), Some(weight), "lost element {}", id);
            }
        }
    }
}

// Property 2: undisturbed walks agree with each other and with `iter`.
proptest! {
    #[test]
    fn prop_undisturbed_walks_visit_each_once(
        cap in 1usize..=16,
        codes in proptest::collection::vec(0u32..32, 0..40),
    ) {
        let mut sut: Set = ChangeAwareSet::with_capacity_and_hasher(cap, BuildIdentityHasher);
        for (id, &code) in codes.iter().enumerate() {
            sut.insert(Item { id, code, weight: 1 });
        }

        let expected: Vec<usize> = sut.iter().map(|i| i.id).collect();
        prop_assert_eq!(expected.len(), codes.len());
        prop_assert_eq!(expected.iter().collect::<HashSet<_>>().len(), codes.len());

        let mut strict = sut.strict_iter(true);
        let mut strict_seen = Vec::new();
        while strict.has_next(&sut).unwrap() {
            strict_seen.push(strict.next(&sut).unwrap().id);
        }
        prop_assert_eq!(&strict_seen, &expected);

        let live = sut.live_iter();
        let mut live_seen = Vec::new();
        while live.has_next(&sut) {
            live_seen.push(live.next(&mut sut).unwrap().id);
        }
        prop_assert_eq!(&live_seen, &expected);
        prop_assert!(live.next(&mut sut).is_err());
        prop_assert_eq!(sut.live_iter_count(), 0);
    }
}

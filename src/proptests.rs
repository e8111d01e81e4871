use super::AvlTree;

use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i16),
    Remove(i16),
    Get(i16),
    Clear,
}

fn key_strategy() -> impl Strategy<Value = i16> + Clone {
    // Narrow key range so duplicates and removals of present keys are common
    -64i16..64
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => key.clone().prop_map(Op::Insert),
        30 => key.clone().prop_map(Op::Remove),
        19 => key.clone().prop_map(Op::Get),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=1000)
}

fn model_remove(model: &mut BTreeMap<i16, u32>, key: i16) -> bool {
    match model.get_mut(&key) {
        None => false,
        Some(count) if *count > 1 => {
            *count -= 1;
            true
        }
        Some(_) => {
            model.remove(&key);
            true
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut tree: AvlTree<i16> = AvlTree::new();
        let mut model: BTreeMap<i16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let created = tree.insert(key);
                    let counter = model.entry(key).or_insert(0);
                    *counter += 1;
                    prop_assert_eq!(created, *counter == 1);
                }
                Op::Remove(key) => {
                    let removed = tree.remove(&key);
                    prop_assert_eq!(removed, model_remove(&mut model, key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(tree.get(&key), model.get_key_value(&key).map(|(k, _)| k));
                    prop_assert_eq!(tree.count(&key), model.get(&key).copied().unwrap_or(0));
                }
                Op::Clear => {
                    tree.clear();
                    model.clear();
                }
            }

            tree.check_consistency();
            prop_assert_eq!(tree.len(), model.len());
            prop_assert_eq!(tree.is_empty(), model.is_empty());
            prop_assert_eq!(tree.min(), model.keys().next());
            prop_assert_eq!(tree.max(), model.keys().next_back());
        }

        let mut level_order: Vec<i16> = tree.level_order().into_iter().copied().collect();
        level_order.sort();
        let expected: Vec<i16> = model.keys().copied().collect();
        prop_assert_eq!(level_order, expected);
    }

    #[test]
    fn prop_height_is_logarithmic(keys in prop::collection::vec(any::<i32>(), 1..=2000)) {
        let tree: AvlTree<i32> = keys.into_iter().collect();
        // AVL height bound: h < 1.4405 * log2(n + 2)
        let bound = 1.4405 * ((tree.len() + 2) as f64).log2();
        prop_assert!((tree.height() as f64) < bound);
    }

    #[test]
    fn prop_round_trip(keys in prop::collection::vec(key_strategy(), 0..=200), key in key_strategy()) {
        let mut tree: AvlTree<i16> = keys.into_iter().collect();
        let before = format!("{:?}", tree);
        let len = tree.len();

        tree.insert(key);
        prop_assert!(tree.remove(&key));

        tree.check_consistency();
        prop_assert_eq!(tree.len(), len);
        prop_assert_eq!(format!("{:?}", tree), before);
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Property tests for the merge algebra.
//!
//! 1. Unknown is the identity of merge.
//! 2. Merge is commutative: both orders agree on kind and line numbers,
//!    and fail together.
//! 3. Merge is associative whenever every intermediate merge succeeds.
//! 4. Merge is idempotent.

use std::collections::BTreeMap;

use proptest::prelude::*;

use super::model::{merge, Structure, StructureKind};

const FIELD_POOL: &[&str] = &["a", "b", "c", "name", "items"];

fn arb_flat() -> impl Strategy<Value = Structure> {
    prop_oneof![
        Just(Structure::unknown()),
        Just(Structure::scalar()),
        Just(Structure::string()),
        Just(Structure::number()),
        Just(Structure::boolean()),
    ]
}

fn arb_structure(depth: u32) -> BoxedStrategy<Structure> {
    let flat = (arb_flat(), prop::collection::btree_set(1u32..6, 0..3))
        .prop_map(|(s, lines)| s.with_lines(lines.iter()));
    if depth == 0 {
        return flat.boxed();
    }

    let inner = arb_structure(depth - 1);
    prop_oneof![
        4 => flat,
        2 => inner.clone().prop_map(Structure::list),
        1 => prop::collection::vec(inner.clone(), 0..3).prop_map(Structure::tuple),
        2 => prop::collection::btree_map(
            prop::sample::select(FIELD_POOL).prop_map(str::to_string),
            inner,
            0..3,
        )
        .prop_map(|fields: BTreeMap<String, Structure>| Structure::dictionary(fields)),
    ]
    .boxed()
}

fn same(a: &Structure, b: &Structure) -> bool {
    a.to_string() == b.to_string() && a.linenos == b.linenos
}

proptest! {
    #[test]
    fn unknown_is_identity(x in arb_structure(3)) {
        let left = merge(&Structure::unknown(), &x).unwrap();
        let right = merge(&x, &Structure::unknown()).unwrap();
        prop_assert_eq!(&left, &x);
        prop_assert_eq!(&right, &x);
    }

    #[test]
    fn merge_is_commutative(a in arb_structure(3), b in arb_structure(3)) {
        match (merge(&a, &b), merge(&b, &a)) {
            (Ok(ab), Ok(ba)) => prop_assert!(same(&ab, &ba), "{} vs {}", ab, ba),
            (Err(_), Err(_)) => {}
            (ab, ba) => prop_assert!(false, "asymmetric merge: {:?} / {:?}", ab, ba),
        }
    }

    #[test]
    fn merge_is_associative(
        a in arb_structure(2),
        b in arb_structure(2),
        c in arb_structure(2),
    ) {
        let left = merge(&a, &b).and_then(|ab| merge(&ab, &c));
        let right = merge(&b, &c).and_then(|bc| merge(&a, &bc));
        match (left, right) {
            (Ok(l), Ok(r)) => prop_assert!(same(&l, &r), "{} vs {}", l, r),
            (Err(_), Err(_)) => {}
            (l, r) => prop_assert!(false, "associativity broken: {:?} / {:?}", l, r),
        }
    }

    #[test]
    fn merge_is_idempotent(x in arb_structure(3)) {
        let merged = merge(&x, &x).unwrap();
        prop_assert!(same(&merged, &x));
    }

    #[test]
    fn containers_never_merge_with_scalars(x in arb_structure(2)) {
        prop_assume!(matches!(
            x.kind,
            StructureKind::List(_) | StructureKind::Tuple(_) | StructureKind::Dictionary(_)
        ));
        prop_assert!(merge(&x, &Structure::scalar()).is_err());
        prop_assert!(merge(&Structure::string(), &x).is_err());
    }
}

use mathdoc_core::{Ast, Fragment, MathKind, Position};
use proptest::prelude::*;
use std::cmp::Ordering;

fn path() -> impl Strategy<Value = Position> {
    prop::collection::vec(0usize..4, 0..5).prop_map(Position::new)
}

proptest! {
    #[test]
    fn prop_order_is_antisymmetric(a in path(), b in path()) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a == b, a.cmp(&b) == Ordering::Equal);
    }

    #[test]
    fn prop_order_is_transitive(a in path(), b in path(), c in path()) {
        if a <= b && b <= c {
            prop_assert!(a <= c);
        }
    }

    #[test]
    fn prop_ancestor_sorts_first(a in path(), tail in prop::collection::vec(0usize..4, 1..3)) {
        let mut indices = a.indices().to_vec();
        indices.extend(tail);
        let descendant = Position::new(indices);
        prop_assert!(a < descendant);
        prop_assert!(a.is_ancestor_of(&descendant));
    }
}

#[test]
fn test_order_matches_document_order() {
    let ast = Ast::from_lines([
        Fragment::line("ab"),
        Fragment {
            kind: mathdoc_core::NodeKind::Line { indentation: 0 },
            children: vec![
                Fragment::char("x"),
                Fragment::math(MathKind::Fraction, "12", "3"),
                Fragment::math(MathKind::Root, "y", ""),
                Fragment::eol(),
            ],
        },
        Fragment::line(""),
    ]);

    let positions: Vec<Position> = ast
        .descendants(ast.root())
        .map(|id| ast.position_of(id).unwrap())
        .collect();
    assert!(positions.len() > 10);
    for pair in positions.windows(2) {
        assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
    }
}

//! End-to-end search scenarios, one per shape of outcome the engine can
//! produce: a view conversion, ambiguity, shadowing, divergence, and a
//! self-referential by-name implicit tied through the synthetic
//! dictionary class.

use givens_ir::{Oracle, Prototype, SearchFailureType, SearchResult, Symbol};
use givens_integration::{FixtureOracle, SymbolKind, TreeData};
use givens_recursive::{infer_implicit, infer_view, SearchConfig};

use crate::test_util::{contextual_scope, lower_ok};

/// A bare, non-method term reference converts a `Source` argument to
/// `Target` via `inferView`: `toTarget`'s declared type is a plain
/// `TermRef`, the one shape `view_kind` classifies as a conversion
/// unconditionally (an overloaded reference "cannot be discarded").
#[test]
fn single_conversion_view_succeeds() {
    let mut oracle = FixtureOracle::new();
    let owner = oracle.declare_symbol("Owner", None, SymbolKind::Witness);
    let source_cls = oracle.declare_symbol("Source", None, SymbolKind::Class);
    let target_cls = oracle.declare_symbol("Target", None, SymbolKind::Class);
    let source_ty = oracle.class_ty(source_cls, Vec::new());
    let target_ty = oracle.class_ty(target_cls, Vec::new());

    let to_target = oracle.declare_symbol("toTarget", Some(owner), SymbolKind::Given);
    let to_target_ty = oracle.term_ref_ty(to_target);
    oracle.set_type(to_target, to_target_ty);

    let src_val = oracle.declare_symbol("srcVal", Some(owner), SymbolKind::Param);
    oracle.set_type(src_val, source_ty);

    let placeholder = oracle.wildcard_ty();
    let contextual = contextual_scope(&[(to_target, placeholder)]);
    let argument = oracle.tree_ident(src_val);

    let result = infer_view(
        &mut oracle,
        owner,
        Some(&contextual),
        source_ty,
        target_ty,
        argument,
        SearchConfig::new(),
    );

    match result {
        SearchResult::Success(success) => {
            assert_eq!(
                success.tree,
                TreeData::Apply(
                    Box::new(TreeData::Ident(to_target)),
                    vec![TreeData::Ident(src_val)],
                )
            );
        }
        SearchResult::Failure(f) => panic!("expected a successful conversion, got {f:?}"),
    }
}

/// Two equally-preferred values of the same class, same owner, same
/// arity -- `compare` cannot break the tie, so the search reports
/// `Ambiguous` rather than picking one arbitrarily.
#[test]
fn two_equally_good_values_are_ambiguous() {
    let src = "
        class Owner
        class Ambi
        given g1 : Owner.Ambi -> Ambi
        given g2 : Owner.Ambi -> Ambi
    ";
    let (mut oracle, names) = lower_ok(src);
    let ambi_ty = oracle.class_type(names["Ambi"]);
    let placeholder = oracle.wildcard_ty();
    let contextual = contextual_scope(&[
        (names["g1"], placeholder),
        (names["g2"], placeholder),
    ]);

    let result = infer_implicit(
        &mut oracle,
        names["Owner"],
        Some(&contextual),
        &Prototype::Value(ambi_ty),
        SearchConfig::new(),
    );

    assert!(result.is_ambiguous(), "expected Ambiguous, got {result:?}");
}

/// A contextual candidate that would otherwise succeed is shadowed by an
/// unrelated binding of the same bare name at the use site.
#[test]
fn shadowed_candidate_fails_with_shadowed() {
    let src = "
        class ShadowOwner
        class ShadowTarget
        class OtherOwner
        given outer : ShadowOwner.ShadowTarget -> ShadowTarget
        field blocker : OtherOwner.ShadowTarget
        shadow outer -> blocker
    ";
    let (mut oracle, names) = lower_ok(src);
    let target_ty = oracle.class_type(names["ShadowTarget"]);
    let placeholder = oracle.wildcard_ty();
    let contextual = contextual_scope(&[(names["outer"], placeholder)]);

    let result = infer_implicit(
        &mut oracle,
        names["ShadowOwner"],
        Some(&contextual),
        &Prototype::Value(target_ty),
        SearchConfig::new(),
    );

    assert!(
        matches!(result, SearchResult::Failure(SearchFailureType::Shadowed { .. })),
        "expected Shadowed, got {result:?}",
    );
}

/// A contextual implicit requiring itself, non-by-name, at the same type:
/// `check_divergence` catches the exact self-reference on first re-entry,
/// independent of any structural-growth heuristic.
#[test]
fn self_referential_strict_implicit_diverges() {
    let src = "
        class Owner
        class Loopy
        given spin : Owner.Loopy implicit Loopy -> Loopy
    ";
    let (mut oracle, names) = lower_ok(src);
    let loopy_ty = oracle.class_type(names["Loopy"]);
    let placeholder = oracle.wildcard_ty();
    let contextual = contextual_scope(&[(names["spin"], placeholder)]);

    let result = infer_implicit(
        &mut oracle,
        names["Owner"],
        Some(&contextual),
        &Prototype::Value(loopy_ty),
        SearchConfig::new(),
    );

    assert!(
        result.is_diverging(),
        "expected a diverging self-reference, got {result:?}"
    );
}

/// A by-name implicit parameter requiring another `Box` ties a knot back
/// to its own still-in-progress resolution instead of diverging: the
/// second recursive request for `Box` finds the outer by-name frame and
/// allocates a synthetic dictionary field rather than re-entering `loop`.
/// The field itself is initialized by actually calling `loop` again,
/// passing its own (instance-selected) value back in as the tied-off
/// by-name argument -- not a bare self-reference.
#[test]
fn recursive_by_name_implicit_ties_a_dictionary_knot() {
    let mut oracle = FixtureOracle::new();
    let owner = oracle.declare_symbol("Owner", None, SymbolKind::Witness);
    let box_cls = oracle.declare_symbol("Box", None, SymbolKind::Class);
    let box_ty = oracle.class_ty(box_cls, Vec::new());
    let by_name_box_ty = oracle.by_name_ty(box_ty);

    let loop_sym = oracle.declare_symbol("loop", Some(owner), SymbolKind::Given);
    let loop_ty = oracle.method_ty(true, vec![by_name_box_ty], box_ty);
    oracle.set_type(loop_sym, loop_ty);

    let placeholder = oracle.wildcard_ty();
    let contextual = contextual_scope(&[(loop_sym, placeholder)]);

    let result = infer_implicit(
        &mut oracle,
        owner,
        Some(&contextual),
        &Prototype::Value(box_ty),
        SearchConfig::new(),
    );

    let success = match result {
        SearchResult::Success(success) => success,
        SearchResult::Failure(f) => panic!("expected the knot to tie successfully, got {f:?}"),
    };

    let (defs, rewritten_top) = match success.tree {
        TreeData::Block(defs, rewritten_top) => (defs, rewritten_top),
        other => panic!("expected the dictionary class/instance block, got {other:?}"),
    };
    assert_eq!(defs.len(), 2, "expected [ClassDef, instance ValDef], got {defs:?}");

    let (class_sym, parents, fields) = match &defs[0] {
        TreeData::ClassDef(sym, parents, fields) => (*sym, parents, fields),
        other => panic!("expected a ClassDef as the first block statement, got {other:?}"),
    };
    assert_eq!(parents.len(), 2, "expected the object-root and serializability-marker parents");
    assert_eq!(fields.len(), 1, "expected exactly the one tied Box field");

    let (field_sym, field_rhs) = match &fields[0] {
        TreeData::ValDef(sym, rhs) => (*sym, rhs.as_ref()),
        other => panic!("expected a ValDef field, got {other:?}"),
    };

    let instance_sym = match &defs[1] {
        TreeData::ValDef(sym, rhs) => {
            assert_eq!(**rhs, TreeData::New(class_sym));
            *sym
        }
        other => panic!("expected the instance ValDef as the second block statement, got {other:?}"),
    };

    let field_select = TreeData::Select(Box::new(TreeData::Ident(instance_sym)), field_sym);
    assert_eq!(
        field_rhs,
        &TreeData::Apply(Box::new(TreeData::Ident(loop_sym)), vec![field_select.clone()]),
        "the field must call `loop` again with its own value, not just alias itself",
    );
    assert_eq!(
        *rewritten_top,
        TreeData::Apply(
            Box::new(TreeData::Ident(loop_sym)),
            vec![TreeData::Apply(Box::new(TreeData::Ident(loop_sym)), vec![field_select])],
        ),
    );
}

/// Sanity check on `all_implicits`: both tied values are visible to
/// diagnostics even when only one of them is picked as the answer.
#[test]
fn all_implicits_lists_every_eligible_candidate() {
    let src = "
        class Owner
        class Ambi
        given g1 : Owner.Ambi -> Ambi
        given g2 : Owner.Ambi -> Ambi
    ";
    let (mut oracle, names) = lower_ok(src);
    let ambi_ty = oracle.class_type(names["Ambi"]);
    let placeholder = oracle.wildcard_ty();
    let contextual = contextual_scope(&[
        (names["g1"], placeholder),
        (names["g2"], placeholder),
    ]);
    let mut scope_cache = givens_solve::ScopeCache::new();

    let found = givens_recursive::all_implicits(
        &oracle,
        Some(&contextual),
        &mut scope_cache,
        &Prototype::Value(ambi_ty),
    );

    let symbols: Vec<Symbol> = found.iter().map(|c| c.reference.term_ref().symbol).collect();
    assert!(symbols.contains(&names["g1"]));
    assert!(symbols.contains(&names["g2"]));
}

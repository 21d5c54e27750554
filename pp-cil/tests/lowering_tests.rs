// -----------------------------------------------------------------------------
// pp-cil — Rule and Symbol Lowering Integration Tests
// -----------------------------------------------------------------------------

use pp_cil::ebitmap::Ebitmap;
use pp_cil::module_package_to_cil;
use pp_cil::policy::*;

// -----------------------------------------------------------------------------
// Builders
// -----------------------------------------------------------------------------

fn emit(pkg: &PolicyPackage) -> String {
    let mut out = Vec::new();
    module_package_to_cil(pkg, &mut out).expect("lowering failed");
    String::from_utf8(out).expect("output is not utf-8")
}

fn bits(indices: &[u32]) -> Ebitmap {
    indices.iter().copied().collect()
}

fn typeset(indices: &[u32]) -> TypeSet {
    TypeSet {
        types: bits(indices),
        negset: Ebitmap::new(),
        flags: SetFlags::empty(),
    }
}

fn roleset(indices: &[u32]) -> RoleSet {
    RoleSet {
        roles: bits(indices),
        flags: SetFlags::empty(),
    }
}

fn file_class() -> ClassDatum {
    ClassDatum {
        value: 1,
        permissions: [("read".to_owned(), 1), ("write".to_owned(), 2)].into(),
        ..ClassDatum::default()
    }
}

/// A module policy with class `file` (read, write) and types `a`, `b`.
fn module_pdb() -> PolicyDb {
    let mut pdb = PolicyDb::default();
    pdb.name = "m".to_owned();
    pdb.policy_type = PolicyType::Module;

    pdb.classes.val_to_name = vec!["file".to_owned()];
    pdb.classes.table.insert("file".to_owned(), file_class());

    pdb.types.val_to_name = vec!["a".to_owned(), "b".to_owned()];
    pdb.types
        .table
        .insert("a".to_owned(), TypeDatum::new(1, TypeFlavor::Type));
    pdb.types
        .table
        .insert("b".to_owned(), TypeDatum::new(2, TypeFlavor::Type));

    pdb
}

fn single_block(pdb: &mut PolicyDb, decl: AvruleDecl) {
    pdb.global.push(AvruleBlock {
        flags: BlockFlags::empty(),
        decls: vec![decl],
    });
}

fn allow_rule(src: &[u32], tgt: &[u32], perms: u32) -> Avrule {
    Avrule {
        kind: AvruleKind::Allow,
        flags: AvruleFlags::empty(),
        stypes: typeset(src),
        ttypes: typeset(tgt),
        perms: vec![ClassPermNode { class: 1, data: perms }],
    }
}

fn package(pdb: PolicyDb) -> PolicyPackage {
    PolicyPackage {
        policy: pdb,
        ..PolicyPackage::default()
    }
}

fn balanced(output: &str) -> bool {
    let mut depth: i64 = 0;
    for c in output.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

// -----------------------------------------------------------------------------
// Access-vector rules
// -----------------------------------------------------------------------------

#[test]
fn simple_allow_rule() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    decl.avrules.push(allow_rule(&[0], &[1], 0b01));
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(allow a b (file (read)))\n"), "output: {out}");
}

#[test]
fn allow_rule_multiple_perms() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    decl.avrules.push(allow_rule(&[0], &[1], 0b11));
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(allow a b (file (read write)))\n"), "output: {out}");
}

#[test]
fn self_flag_expands_per_source() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    let mut rule = allow_rule(&[0, 1], &[], 0b01);
    rule.flags = AvruleFlags::SELF;
    decl.avrules.push(rule);
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    let a = out.find("(allow a self (file (read)))").expect("missing a-self line");
    let b = out.find("(allow b self (file (read)))").expect("missing b-self line");
    assert!(a < b, "self lines out of order: {out}");
    assert_eq!(out.matches("(allow ").count(), 2, "output: {out}");
}

#[test]
fn avrule_line_count_is_sources_times_targets_plus_self() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    let mut rule = allow_rule(&[0, 1], &[1], 0b01);
    rule.flags = AvruleFlags::SELF;
    decl.avrules.push(rule);
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    // m = 2 sources, n = 1 target, self = 1: m * (n + 1) lines.
    assert_eq!(out.matches("(allow ").count(), 4, "output: {out}");
}

#[test]
fn type_transition_rule() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    decl.avrules.push(Avrule {
        kind: AvruleKind::Transition,
        flags: AvruleFlags::empty(),
        stypes: typeset(&[0]),
        ttypes: typeset(&[1]),
        perms: vec![ClassPermNode { class: 1, data: 2 }],
    });
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(typetransition a b file b)\n"), "output: {out}");
}

#[test]
fn auditdeny_keeps_historical_operator_spelling() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    decl.avrules.push(Avrule {
        kind: AvruleKind::AuditDeny,
        flags: AvruleFlags::empty(),
        stypes: typeset(&[0]),
        ttypes: typeset(&[1]),
        perms: vec![ClassPermNode { class: 1, data: 0b01 }],
    });
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(auditdenty a b (file (read)))\n"), "output: {out}");
}

// -----------------------------------------------------------------------------
// Anonymous set synthesis
// -----------------------------------------------------------------------------

#[test]
fn negated_target_set_synthesises_attribute() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    let mut rule = allow_rule(&[0], &[], 0b01);
    rule.ttypes = TypeSet {
        types: bits(&[0]),
        negset: bits(&[1]),
        flags: SetFlags::empty(),
    };
    decl.avrules.push(rule);
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(typeattribute m_typeattr_1)\n"), "output: {out}");
    assert!(
        out.contains("(typeattributeset m_typeattr_1 (and (a ) (not (b ))))\n"),
        "output: {out}"
    );
    assert!(out.contains("(allow a m_typeattr_1 (file (read)))\n"), "output: {out}");
}

#[test]
fn star_set_synthesises_all_attribute() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    let mut rule = allow_rule(&[0], &[], 0b01);
    rule.ttypes = TypeSet {
        types: Ebitmap::new(),
        negset: Ebitmap::new(),
        flags: SetFlags::STAR,
    };
    decl.avrules.push(rule);
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(
        out.contains("(typeattributeset m_typeattr_1 (all))\n"),
        "output: {out}"
    );
}

#[test]
fn synthesised_attribute_names_are_unique() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    for _ in 0..2 {
        let mut rule = allow_rule(&[0], &[], 0b01);
        rule.ttypes = TypeSet {
            types: bits(&[0]),
            negset: bits(&[1]),
            flags: SetFlags::empty(),
        };
        decl.avrules.push(rule);
    }
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(typeattribute m_typeattr_1)\n"), "output: {out}");
    assert!(out.contains("(typeattribute m_typeattr_2)\n"), "output: {out}");
}

// -----------------------------------------------------------------------------
// Conditionals
// -----------------------------------------------------------------------------

#[test]
fn tunable_conditional_header() {
    let mut pdb = module_pdb();
    pdb.booleans.val_to_name = vec!["b1".to_owned(), "b2".to_owned()];

    let mut decl = AvruleDecl::new(1);
    decl.cond_list.push(CondNode {
        tunable: true,
        expr: vec![
            CondExprNode::Bool(1),
            CondExprNode::Bool(2),
            CondExprNode::Op(CondOp::Not),
            CondExprNode::Op(CondOp::And),
        ],
        true_rules: vec![allow_rule(&[0], &[1], 0b01)],
        false_rules: Vec::new(),
    });
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(
        out.contains("(tunableif (and (b1) (not (b2)))\n"),
        "output: {out}"
    );
    assert!(
        out.contains("    (true\n        (allow a b (file (read)))\n    )\n)\n"),
        "output: {out}"
    );
}

#[test]
fn booleanif_header_without_tunable_flag() {
    let mut pdb = module_pdb();
    pdb.booleans.val_to_name = vec!["b1".to_owned()];

    let mut decl = AvruleDecl::new(1);
    decl.cond_list.push(CondNode {
        tunable: false,
        expr: vec![CondExprNode::Bool(1)],
        true_rules: Vec::new(),
        false_rules: vec![allow_rule(&[0], &[1], 0b01)],
    });
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(booleanif (b1)\n"), "output: {out}");
    assert!(out.contains("    (false\n"), "output: {out}");
}

// -----------------------------------------------------------------------------
// Role and filename rules
// -----------------------------------------------------------------------------

#[test]
fn role_transition_expands_classes() {
    let mut pdb = module_pdb();
    pdb.roles.val_to_name = vec!["r".to_owned()];

    let mut decl = AvruleDecl::new(1);
    decl.role_tr_rules.push(RoleTransRule {
        roles: roleset(&[0]),
        types: typeset(&[0]),
        classes: bits(&[0]),
        new_role: 1,
    });
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(roletransition r a file r)\n"), "output: {out}");
}

#[test]
fn role_allow_pairs() {
    let mut pdb = module_pdb();
    pdb.roles.val_to_name = vec!["r1".to_owned(), "r2".to_owned()];

    let mut decl = AvruleDecl::new(1);
    decl.role_allow_rules.push(RoleAllowRule {
        roles: roleset(&[0]),
        new_roles: roleset(&[1]),
    });
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(roleallow r1 r2)\n"), "output: {out}");
}

#[test]
fn filename_transition() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    decl.filename_trans_rules.push(FilenameTransRule {
        stypes: typeset(&[0]),
        ttypes: typeset(&[1]),
        tclass: 1,
        name: "ld.so.cache".to_owned(),
        otype: 2,
    });
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(
        out.contains("(typetransition a b file ld.so.cache b)\n"),
        "output: {out}"
    );
}

// -----------------------------------------------------------------------------
// Range transitions and MLS gating
// -----------------------------------------------------------------------------

fn range_rule() -> RangeTransRule {
    RangeTransRule {
        stypes: typeset(&[0]),
        ttypes: typeset(&[1]),
        tclasses: bits(&[0]),
        range: MlsSemanticRange {
            low: MlsSemanticLevel { sens: 1, cats: Vec::new() },
            high: MlsSemanticLevel { sens: 1, cats: Vec::new() },
        },
    }
}

#[test]
fn range_transition_dropped_without_mls() {
    let mut pdb = module_pdb();
    let mut decl = AvruleDecl::new(1);
    decl.range_tr_rules.push(range_rule());
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(!out.contains("(rangetransition"), "output: {out}");
}

#[test]
fn range_transition_emitted_with_mls() {
    let mut pdb = module_pdb();
    pdb.mls = true;
    pdb.sensitivities.val_to_name = vec!["s0".to_owned()];

    let mut decl = AvruleDecl::new(1);
    decl.range_tr_rules.push(range_rule());
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(
        out.contains("(rangetransition a b file (s0 s0))\n"),
        "output: {out}"
    );
}

#[test]
fn range_transition_with_category_runs() {
    let mut pdb = module_pdb();
    pdb.mls = true;
    pdb.sensitivities.val_to_name = vec!["s0".to_owned()];
    pdb.categories.val_to_name = vec!["c0".to_owned(), "c1".to_owned(), "c2".to_owned()];

    let mut rule = range_rule();
    rule.range.high = MlsSemanticLevel {
        sens: 1,
        cats: vec![CatRange { low: 1, high: 1 }, CatRange { low: 2, high: 3 }],
    };
    let mut decl = AvruleDecl::new(1);
    decl.range_tr_rules.push(rule);
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(
        out.contains("(rangetransition a b file (s0 (s0 (c0 (range c1 c2)))))\n"),
        "output: {out}"
    );
}

// -----------------------------------------------------------------------------
// Constraints
// -----------------------------------------------------------------------------

#[test]
fn constrain_with_attribute_pair() {
    let mut pdb = module_pdb();
    let class = pdb.classes.table.get_mut("file").expect("file class");
    class.constraints.push(Constraint {
        permissions: 0b01,
        expr: vec![ConstraintExprNode::Attr {
            op: ConstraintOp::Eq,
            attr: CexprAttr::USER,
        }],
    });
    pdb.classes.scope.insert(
        "file".to_owned(),
        ScopeDatum { scope: ScopeKind::Decl, decl_ids: vec![1] },
    );

    let mut decl = AvruleDecl::new(1);
    decl.declared.kind_mut(SymbolKind::Classes).set(0);
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(out.contains("(class file (read write ))\n"), "output: {out}");
    assert!(
        out.contains("(constrain (file (read)) (eq u1 u2))\n"),
        "output: {out}"
    );
}

#[test]
fn mls_validatetrans_with_names_leaf() {
    let mut pdb = module_pdb();
    pdb.mls = true;
    let class = pdb.classes.table.get_mut("file").expect("file class");
    class.validatetrans.push(Constraint {
        permissions: 0,
        expr: vec![ConstraintExprNode::Names {
            op: ConstraintOp::Eq,
            attr: CexprAttr::TYPE.union(CexprAttr::TARGET),
            names: ConstraintNames::Types(TypeSet {
                types: [0u32].into_iter().collect(),
                negset: Ebitmap::new(),
                flags: SetFlags::empty(),
            }),
        }],
    });
    pdb.classes.scope.insert(
        "file".to_owned(),
        ScopeDatum { scope: ScopeKind::Decl, decl_ids: vec![1] },
    );

    let mut decl = AvruleDecl::new(1);
    decl.declared.kind_mut(SymbolKind::Classes).set(0);
    single_block(&mut pdb, decl);

    let out = emit(&package(pdb));
    assert!(
        out.contains("(mlsvalidatetrans file (eq t2 a))\n"),
        "output: {out}"
    );
}

// -----------------------------------------------------------------------------
// Base preamble
// -----------------------------------------------------------------------------

#[test]
fn base_preamble_lines_in_order() {
    let pdb = PolicyDb::default();
    let out = emit(&package(pdb));

    let expected = "(sensitivity s0)\n\
                    (sensitivityorder (s0))\n\
                    (level systemlow (s0))\n\
                    (role object_r)\n\
                    (handleunknown deny)\n\
                    (mls false)\n";
    assert!(out.starts_with(expected), "output: {out}");
}

#[test]
fn mls_base_skips_default_level() {
    let mut pdb = PolicyDb::default();
    pdb.mls = true;
    pdb.handle_unknown = HandleUnknown::Allow;
    let out = emit(&package(pdb));

    assert!(!out.contains("(level systemlow"), "output: {out}");
    assert!(out.starts_with("(role object_r)\n(handleunknown allow)\n(mls true)\n"));
}

#[test]
fn module_has_no_preamble() {
    let pdb = module_pdb();
    let out = emit(&package(pdb));
    assert!(!out.contains("(handleunknown"), "output: {out}");
    assert!(!out.contains("(mls "), "output: {out}");
}

// -----------------------------------------------------------------------------
// Policy capabilities
// -----------------------------------------------------------------------------

#[test]
fn policy_capabilities_resolve_by_bit() {
    let mut pdb = module_pdb();
    pdb.policycaps = bits(&[0, 1]);
    let out = emit(&package(pdb));

    assert!(out.contains("(policycap network_peer_controls)\n"), "output: {out}");
    assert!(out.contains("(policycap open_perms)\n"), "output: {out}");
}

#[test]
fn unknown_policy_capability_is_fatal() {
    let mut pdb = module_pdb();
    pdb.policycaps = bits(&[63]);

    let mut out = Vec::new();
    let err = module_package_to_cil(&package(pdb), &mut out);
    assert!(err.is_err());
}

// -----------------------------------------------------------------------------
// Initial SIDs
// -----------------------------------------------------------------------------

fn sid_pdb() -> PolicyDb {
    let mut pdb = PolicyDb::default();
    pdb.users.val_to_name = vec!["system_u".to_owned()];
    pdb.roles.val_to_name = vec!["object_r".to_owned()];
    pdb.types.val_to_name = vec!["kernel_t".to_owned()];

    let context = Context {
        user: 1,
        role: 1,
        ty: 1,
        range: MlsRange::default(),
    };
    pdb.ocontexts = Ocontexts::Selinux(SelinuxOcontexts {
        initial_sids: vec![
            InitialSid { sid: 1, context: context.clone() },
            InitialSid { sid: 4, context },
        ],
        ..SelinuxOcontexts::default()
    });

    pdb
}

#[test]
fn initial_sids_emit_sid_and_context() {
    let out = emit(&package(sid_pdb()));

    assert!(out.contains("(sid kernel)\n"), "output: {out}");
    assert!(out.contains("(sid fs)\n"), "output: {out}");
    assert!(
        out.contains("(sidcontext kernel (system_u object_r kernel_t (systemlow systemlow)))\n"),
        "output: {out}"
    );
    assert_eq!(out.matches("(sidcontext ").count(), 2, "output: {out}");
}

#[test]
fn sidorder_reverses_input_order() {
    let out = emit(&package(sid_pdb()));
    assert!(out.contains("(sidorder (fs kernel ))\n"), "output: {out}");
}

// -----------------------------------------------------------------------------
// Determinism and well-formedness
// -----------------------------------------------------------------------------

fn rich_pdb() -> PolicyDb {
    let mut pdb = sid_pdb();
    pdb.name = "rich".to_owned();
    pdb.policy_type = PolicyType::Module;
    pdb.classes.val_to_name = vec!["file".to_owned()];
    pdb.classes.table.insert("file".to_owned(), file_class());
    pdb.types.val_to_name = vec!["a".to_owned(), "b".to_owned()];
    pdb.booleans.val_to_name = vec!["b1".to_owned()];

    let mut decl = AvruleDecl::new(1);
    let mut rule = allow_rule(&[0, 1], &[0], 0b11);
    rule.flags = AvruleFlags::SELF;
    decl.avrules.push(rule);
    let mut neg = allow_rule(&[0], &[], 0b01);
    neg.ttypes = TypeSet {
        types: bits(&[0]),
        negset: bits(&[1]),
        flags: SetFlags::empty(),
    };
    decl.avrules.push(neg);
    decl.cond_list.push(CondNode {
        tunable: false,
        expr: vec![CondExprNode::Bool(1)],
        true_rules: vec![allow_rule(&[0], &[1], 0b10)],
        false_rules: Vec::new(),
    });
    pdb.global.push(AvruleBlock {
        flags: BlockFlags::empty(),
        decls: vec![decl],
    });

    let mut optional = AvruleDecl::new(2);
    optional.avrules.push(allow_rule(&[1], &[0], 0b01));
    pdb.global.push(AvruleBlock {
        flags: BlockFlags::OPTIONAL,
        decls: vec![optional],
    });

    pdb
}

#[test]
fn emission_is_deterministic() {
    let pkg = package(rich_pdb());
    assert_eq!(emit(&pkg), emit(&pkg));
}

#[test]
fn output_parentheses_balance() {
    let out = emit(&package(rich_pdb()));
    assert!(balanced(&out), "unbalanced output: {out}");
}

#[test]
fn every_top_level_form_ends_with_newline() {
    let out = emit(&package(rich_pdb()));
    assert!(out.ends_with('\n'), "output: {out}");
}

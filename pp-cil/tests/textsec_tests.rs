// -----------------------------------------------------------------------------
// pp-cil — Text Section Integration Tests
// -----------------------------------------------------------------------------

use pp_cil::module_package_to_cil;
use pp_cil::policy::{PolicyDb, PolicyPackage, PolicyType};

// -----------------------------------------------------------------------------
// Builders
// -----------------------------------------------------------------------------

fn module_package() -> PolicyPackage {
    let mut pdb = PolicyDb::default();
    pdb.name = "m".to_owned();
    pdb.policy_type = PolicyType::Module;
    PolicyPackage {
        policy: pdb,
        ..PolicyPackage::default()
    }
}

fn emit(pkg: &PolicyPackage) -> String {
    let mut out = Vec::new();
    module_package_to_cil(pkg, &mut out).expect("lowering failed");
    String::from_utf8(out).expect("output is not utf-8")
}

fn emit_err(pkg: &PolicyPackage) -> pp_cil::LowerError {
    let mut out = Vec::new();
    module_package_to_cil(pkg, &mut out).expect_err("lowering should fail")
}

// -----------------------------------------------------------------------------
// file_contexts
// -----------------------------------------------------------------------------

#[test]
fn filecon_with_file_mode_and_level() {
    let mut pkg = module_package();
    pkg.file_contexts = "/bin/sh -- system_u:object_r:bin_t:s0\n".to_owned();

    let out = emit(&pkg);
    assert!(
        out.contains("(filecon \"/bin/sh\" \"\" file (system_u object_r bin_t (s0 s0)))\n"),
        "output: {out}"
    );
}

#[test]
fn filecon_without_mode_defaults_to_any() {
    let mut pkg = module_package();
    pkg.file_contexts = "/var(/.*)? system_u:object_r:var_t\n".to_owned();

    let out = emit(&pkg);
    assert!(
        out.contains("(filecon \"/var(/.*)?\" \"\" any (system_u object_r var_t (systemlow systemlow)))\n"),
        "output: {out}"
    );
}

#[test]
fn filecon_none_context_is_empty_list() {
    let mut pkg = module_package();
    pkg.file_contexts = "/dev/null -c <<none>>\n".to_owned();

    let out = emit(&pkg);
    assert!(
        out.contains("(filecon \"/dev/null\" \"\" char ())\n"),
        "output: {out}"
    );
}

#[test]
fn filecon_mode_token_table() {
    let cases = [
        ("--", "file"),
        ("-d", "dir"),
        ("-c", "char"),
        ("-b", "block"),
        ("-s", "socket"),
        ("-p", "pipe"),
        ("-l", "symlink"),
    ];

    for (token, cil) in cases {
        let mut pkg = module_package();
        pkg.file_contexts = format!("/x {token} <<none>>\n");
        let out = emit(&pkg);
        assert!(
            out.contains(&format!("(filecon \"/x\" \"\" {cil} ())\n")),
            "mode {token}: {out}"
        );
    }
}

#[test]
fn filecon_with_level_range() {
    let mut pkg = module_package();
    pkg.file_contexts = "/srv -d system_u:object_r:srv_t:s0:c0,c2.c5-s1\n".to_owned();

    let out = emit(&pkg);
    assert!(
        out.contains(
            "(filecon \"/srv\" \"\" dir (system_u object_r srv_t ((s0 (c0 (range c2 c5))) s1)))\n"
        ),
        "output: {out}"
    );
}

#[test]
fn filecon_comments_and_blanks_skipped() {
    let mut pkg = module_package();
    pkg.file_contexts = "# comment\n\n   # indented comment\n/x -- <<none>>\n".to_owned();

    let out = emit(&pkg);
    assert_eq!(out.matches("(filecon ").count(), 1, "output: {out}");
}

#[test]
fn filecon_unknown_mode_is_fatal() {
    let mut pkg = module_package();
    pkg.file_contexts = "/x -z system_u:object_r:x_t\n".to_owned();

    let err = emit_err(&pkg);
    assert!(err.to_string().contains("invalid file context line"), "error: {err}");
}

#[test]
fn filecon_single_token_is_fatal() {
    let mut pkg = module_package();
    pkg.file_contexts = "/only-a-regex\n".to_owned();

    assert!(emit_err(&pkg).to_string().contains("invalid file context line"));
}

// -----------------------------------------------------------------------------
// seusers
// -----------------------------------------------------------------------------

#[test]
fn seuser_default_entry() {
    let mut pkg = module_package();
    pkg.seusers = "__default__:unconfined_u:s0-s0:c0.c1023\n".to_owned();

    let out = emit(&pkg);
    assert!(
        out.contains("(selinuxuserdefault unconfined_u (s0 (s0 ((range c0 c1023)))))\n"),
        "output: {out}"
    );
}

#[test]
fn seuser_named_entry() {
    let mut pkg = module_package();
    pkg.seusers = "jblow:staff_u:s0\n".to_owned();

    let out = emit(&pkg);
    assert!(
        out.contains("(selinuxuser jblow staff_u (s0 s0))\n"),
        "output: {out}"
    );
}

#[test]
fn seuser_without_range_uses_default_level() {
    let mut pkg = module_package();
    pkg.seusers = "jblow:staff_u\n".to_owned();

    let out = emit(&pkg);
    assert!(
        out.contains("(selinuxuser jblow staff_u (systemlow systemlow))\n"),
        "output: {out}"
    );
}

#[test]
fn seuser_comments_and_blanks_skipped() {
    let mut pkg = module_package();
    pkg.seusers = "# seusers\n\njblow:staff_u\n".to_owned();

    let out = emit(&pkg);
    assert_eq!(out.matches("(selinuxuser ").count(), 1, "output: {out}");
}

#[test]
fn seuser_malformed_line_is_fatal() {
    let mut pkg = module_package();
    pkg.seusers = "nocolonhere\n".to_owned();

    assert!(emit_err(&pkg).to_string().contains("invalid seuser line"));
}

// -----------------------------------------------------------------------------
// user_extra
// -----------------------------------------------------------------------------

#[test]
fn user_extra_prefix_lines() {
    let mut pkg = module_package();
    pkg.user_extra = "user jblow prefix staff;\nuser root prefix sysadm;\n".to_owned();

    let out = emit(&pkg);
    assert!(out.contains("(userprefix jblow staff)\n"), "output: {out}");
    assert!(out.contains("(userprefix root sysadm)\n"), "output: {out}");
}

#[test]
fn user_extra_malformed_line_is_fatal() {
    let mut pkg = module_package();
    pkg.user_extra = "prefix without user;\n".to_owned();

    assert!(emit_err(&pkg).to_string().contains("invalid user_extra line"));
}

// -----------------------------------------------------------------------------
// netfilter_contexts
// -----------------------------------------------------------------------------

#[test]
fn netfilter_contexts_dropped_without_error() {
    let mut pkg = module_package();
    pkg.netfilter_contexts = "some netfilter data\n".to_owned();

    let out = emit(&pkg);
    assert!(!out.contains("netfilter"), "output: {out}");
}

#[test]
fn empty_sections_emit_nothing() {
    let out = emit(&module_package());
    assert!(out.is_empty(), "output: {out}");
}

//! Property tests for the builtin catalog.

use authstrip_rules::{AccessPolicy, Detector, PolicyMode};
use proptest::prelude::*;

const SITES: &[&str] = &[
    "def a(u=Depends(get_current_user_id_from_jwt)): pass",
    "def b(u=Depends(get_optional_user_id_from_jwt)): pass",
    "def c(u=Depends(get_user_id_from_stream_auth)): pass",
    "@r.get('/x', dependencies=[Depends(verify_admin_api_key)])",
    "    await verify_thread_access(client, thread_id, user_id)",
    "    allowed = await verify_thread_access(client, thread_id, user_id)",
    "    await verify_agent_access(client, agent_id, user_id)",
    "    allowed = await verify_agent_access(client, agent_id, user_id)",
    "    allowed = await verify_thread_access(client, str(tid), user_id)  # why",
    "    result = process(flag=await verify_thread_access(client, tid, uid))",
    "    ok = await verify_agent_access(c, a, u) and await check_quota(u)",
    "    await verify_thread_access(c, t, u); audit(u)",
    "    await verify_thread_access(c, t, ok=await verify_agent_access(c, a))",
];

fn arb_user_id() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[A-Za-z0-9_$@.-]{1,24}").unwrap()
}

proptest! {
    #[test]
    fn replacements_never_rematch_for_any_user_id(
        user_id in arb_user_id(),
        picks in prop::collection::vec(prop::sample::select(SITES.to_vec()), 1..10),
    ) {
        let policy = AccessPolicy::from_mode(PolicyMode::Permissive, Some(&user_id)).unwrap();
        let registry = policy.registry().unwrap();
        let src = picks.join("\n");

        let mut out = src.clone();
        for rule in registry.rules() {
            out = rule.apply(&out).into_owned();
        }

        prop_assert!(Detector::new(&registry).detect(&out).is_empty());
        if src.contains("Depends(get_") {
            let literal = format!("\"{user_id}\"");
            prop_assert!(out.contains(&literal));
        }
    }

    #[test]
    fn application_order_does_not_matter(
        picks in prop::collection::vec(prop::sample::select(SITES.to_vec()), 1..10),
    ) {
        let registry = AccessPolicy::permissive().registry().unwrap();
        let src = picks.join("\n");

        let mut forward = src.clone();
        for rule in registry.rules() {
            forward = rule.apply(&forward).into_owned();
        }
        let mut backward = src;
        for rule in registry.rules().iter().rev() {
            backward = rule.apply(&backward).into_owned();
        }

        prop_assert_eq!(forward, backward);
    }
}

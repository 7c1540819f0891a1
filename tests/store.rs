//! Storage constraints: uniqueness, referential integrity, lookups

mod common;

use common::setup;
use rolemask::{NewGroup, NewRole, NewUser, Permission, RbacError};

#[test]
fn create_and_lookup() {
    let (store, _dir) = setup();
    let (u, r, g) = store
        .transact(|tx| {
            let g = tx.create_group(NewGroup::new("ops").description("Operations"))?;
            let r = tx.create_role(NewRole::new("operator", g.id).description("Runs things"))?;
            let u = tx.create_user(NewUser::new("ann@example.com").username("ann").phone("555-0100"))?;
            Ok((u, r, g))
        })
        .unwrap();

    assert_eq!(store.get_group(g.id).unwrap(), Some(g.clone()));
    assert_eq!(store.group_by_name("ops").unwrap(), Some(g.clone()));
    assert_eq!(store.role_by_name("operator").unwrap(), Some(r.clone()));
    assert_eq!(store.user_by_email("ann@example.com").unwrap(), Some(u.clone()));
    assert_eq!(store.user_by_username("ann").unwrap(), Some(u.clone()));
    assert_eq!(store.list_groups().unwrap(), vec![g.clone()]);
    assert_eq!(store.roles_for_group(g.id).unwrap(), vec![r.clone()]);

    // new roles default to LOGIN, new users start active with no logins
    assert_eq!(r.permissions, Permission::LOGIN);
    assert!(u.active);
    assert_eq!(u.login_count, 0);
    assert!(u.confirmed_at > 0);
}

#[test]
fn ids_are_distinct() {
    let (store, _dir) = setup();
    let ids = store
        .transact(|tx| {
            let g = tx.create_group(NewGroup::new("a"))?;
            let r = tx.create_role(NewRole::new("b", g.id))?;
            let u = tx.create_user(NewUser::new("c@example.com"))?;
            Ok([g.id, r.id, u.id])
        })
        .unwrap();
    assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);
}

#[test]
fn unique_constraints() {
    let (store, _dir) = setup();
    store
        .transact(|tx| {
            let g = tx.create_group(NewGroup::new("ops"))?;
            tx.create_role(NewRole::new("operator", g.id))?;
            tx.create_user(NewUser::new("ann@example.com").username("ann"))?;
            Ok(())
        })
        .unwrap();
    let gid = store.group_by_name("ops").unwrap().unwrap().id;

    let e = store.transact(|tx| tx.create_group(NewGroup::new("ops"))).unwrap_err();
    assert!(matches!(e, RbacError::Duplicate { kind: "group", .. }));
    let e = store.transact(|tx| tx.create_role(NewRole::new("operator", gid))).unwrap_err();
    assert!(matches!(e, RbacError::Duplicate { kind: "role", .. }));
    let e = store.transact(|tx| tx.create_user(NewUser::new("ann@example.com"))).unwrap_err();
    assert!(matches!(e, RbacError::Duplicate { kind: "email", .. }));
    let e = store.transact(|tx| tx.create_user(NewUser::new("bob@example.com").username("ann"))).unwrap_err();
    assert!(matches!(e, RbacError::Duplicate { kind: "username", .. }));

    // the failed transaction left nothing behind
    assert!(store.user_by_email("bob@example.com").unwrap().is_none());
}

#[test]
fn empty_names_rejected() {
    let (store, _dir) = setup();
    let e = store.transact(|tx| tx.create_group(NewGroup::new("  "))).unwrap_err();
    assert!(matches!(e, RbacError::InvalidInput(_)));
    let e = store.transact(|tx| tx.create_user(NewUser::new(""))).unwrap_err();
    assert!(matches!(e, RbacError::InvalidInput(_)));
    let e = store.transact(|tx| tx.create_user(NewUser::new("a@example.com").username(""))).unwrap_err();
    assert!(matches!(e, RbacError::InvalidInput(_)));
}

#[test]
fn role_requires_existing_group() {
    let (store, _dir) = setup();
    let e = store.transact(|tx| tx.create_role(NewRole::new("orphan", 77))).unwrap_err();
    assert!(matches!(e, RbacError::NotFound { kind: "group", .. }));
}

#[test]
fn add_role_requires_both_ends() {
    let (store, _dir) = setup();
    let (uid, rid) = store
        .transact(|tx| {
            let g = tx.create_group(NewGroup::new("ops"))?;
            let r = tx.create_role(NewRole::new("operator", g.id))?;
            Ok((tx.create_user(NewUser::new("a@example.com"))?.id, r.id))
        })
        .unwrap();

    let e = store.transact(|tx| tx.add_role(uid, 999)).unwrap_err();
    assert!(matches!(e, RbacError::NotFound { kind: "role", .. }));
    let e = store.transact(|tx| tx.add_role(999, rid)).unwrap_err();
    assert!(matches!(e, RbacError::NotFound { kind: "user", .. }));
}

#[test]
fn add_role_is_idempotent() {
    let (store, _dir) = setup();
    let (uid, rid) = store
        .transact(|tx| {
            let g = tx.create_group(NewGroup::new("ops"))?;
            let r = tx.create_role(NewRole::new("operator", g.id))?;
            let u = tx.create_user(NewUser::new("a@example.com"))?;
            tx.add_role(u.id, r.id)?;
            tx.add_role(u.id, r.id)?;
            Ok((u.id, r.id))
        })
        .unwrap();

    assert_eq!(store.roles_for_user(uid).unwrap().len(), 1);
    assert_eq!(store.users_for_role(rid).unwrap().len(), 1);
    assert!(store.transact(|tx| tx.remove_role(uid, rid)).unwrap());
    assert!(!store.transact(|tx| tx.remove_role(uid, rid)).unwrap());
}

#[test]
fn memberships_carry_groups() {
    let (store, _dir) = setup();
    let uid = store
        .transact(|tx| {
            let ops = tx.create_group(NewGroup::new("ops"))?;
            let web = tx.create_group(NewGroup::new("web"))?;
            let a = tx.create_role(NewRole::new("operator", ops.id))?;
            let b = tx.create_role(NewRole::new("editor", web.id))?;
            let u = tx.create_user(NewUser::new("a@example.com"))?;
            tx.add_role(u.id, a.id)?;
            tx.add_role(u.id, b.id)?;
            Ok(u.id)
        })
        .unwrap();

    let mut groups: Vec<String> = store.memberships(uid).unwrap().into_iter().map(|m| m.group.name).collect();
    groups.sort();
    assert_eq!(groups, vec!["ops", "web"]);
}

#[test]
fn group_with_roles_cannot_be_deleted() {
    let (store, _dir) = setup();
    let (gid, rid) = store
        .transact(|tx| {
            let g = tx.create_group(NewGroup::new("ops"))?;
            Ok((g.id, tx.create_role(NewRole::new("operator", g.id))?.id))
        })
        .unwrap();

    let e = store.transact(|tx| tx.delete_group(gid)).unwrap_err();
    assert!(matches!(e, RbacError::Integrity(_)));

    store.transact(|tx| tx.delete_role(rid)).unwrap();
    assert!(store.transact(|tx| tx.delete_group(gid)).unwrap());
    assert!(store.group_by_name("ops").unwrap().is_none());
    // name is free again
    store.transact(|tx| tx.create_group(NewGroup::new("ops"))).unwrap();
}

#[test]
fn rename_group_moves_unique_name() {
    let (store, _dir) = setup();
    let (a, _) = store
        .transact(|tx| Ok((tx.create_group(NewGroup::new("a"))?.id, tx.create_group(NewGroup::new("b"))?.id)))
        .unwrap();

    let e = store.transact(|tx| tx.update_group(a, "b", None)).unwrap_err();
    assert!(matches!(e, RbacError::Duplicate { .. }));

    let g = store.transact(|tx| tx.update_group(a, "c", Some("renamed".into()))).unwrap();
    assert_eq!(g.description.as_deref(), Some("renamed"));
    assert!(store.group_by_name("a").unwrap().is_none());
    assert_eq!(store.group_by_name("c").unwrap().map(|g| g.id), Some(a));
}

#[test]
fn delete_user_releases_everything() {
    let (store, _dir) = setup();
    let (uid, rid) = store
        .transact(|tx| {
            let g = tx.create_group(NewGroup::new("ops"))?;
            let r = tx.create_role(NewRole::new("operator", g.id))?;
            let u = tx.create_user(NewUser::new("a@example.com").username("a"))?;
            tx.add_role(u.id, r.id)?;
            Ok((u.id, r.id))
        })
        .unwrap();

    assert!(store.transact(|tx| tx.delete_user(uid)).unwrap());
    assert!(!store.transact(|tx| tx.delete_user(uid)).unwrap());
    assert!(store.get_user(uid).unwrap().is_none());
    assert!(store.users_for_role(rid).unwrap().is_empty());
    store.transact(|tx| tx.create_user(NewUser::new("a@example.com").username("a"))).unwrap();
}

#[test]
fn clear_all_empties_store() {
    let (store, _dir) = setup();
    store
        .transact(|tx| {
            let g = tx.create_group(NewGroup::new("ops"))?;
            tx.create_role(NewRole::new("operator", g.id))?;
            tx.create_user(NewUser::new("a@example.com"))
        })
        .unwrap();

    store.clear_all().unwrap();
    assert!(store.list_groups().unwrap().is_empty());
    assert!(store.user_by_email("a@example.com").unwrap().is_none());
    assert!(store.role_by_name("operator").unwrap().is_none());
}

#[test]
fn failed_create_user_reserves_nothing() {
    let (store, _dir) = setup();
    store.transact(|tx| tx.create_user(NewUser::new("ann@example.com").username("ann"))).unwrap();

    // handle the collision inside a transaction that still commits
    let inner = store
        .transact(|tx| Ok(tx.create_user(NewUser::new("bob@example.com").username("ann"))))
        .unwrap();
    assert!(matches!(inner, Err(RbacError::Duplicate { kind: "username", .. })));
    assert!(store.user_by_email("bob@example.com").unwrap().is_none());

    let bob = store.transact(|tx| tx.create_user(NewUser::new("bob@example.com"))).unwrap();
    assert_eq!(store.user_by_email("bob@example.com").unwrap(), Some(bob));
}

#[test]
fn failed_create_group_and_role_reserve_nothing() {
    let (store, _dir) = setup();
    let gid = store.transact(|tx| Ok(tx.create_group(NewGroup::new("ops"))?.id)).unwrap();
    store.transact(|tx| tx.create_role(NewRole::new("operator", gid))).unwrap();

    let (g, r) = store
        .transact(|tx| Ok((tx.create_group(NewGroup::new("ops")), tx.create_role(NewRole::new("operator", gid)))))
        .unwrap();
    assert!(matches!(g, Err(RbacError::Duplicate { kind: "group", .. })));
    assert!(matches!(r, Err(RbacError::Duplicate { kind: "role", .. })));
    assert_eq!(store.group_by_name("ops").unwrap().map(|g| g.id), Some(gid));
    assert_eq!(store.roles_for_group(gid).unwrap().len(), 1);
}

#[test]
fn overlong_names_rejected() {
    let (store, _dir) = setup();
    let long = "x".repeat(600);

    let e = store.transact(|tx| tx.create_group(NewGroup::new(long.clone()))).unwrap_err();
    assert!(matches!(e, RbacError::InvalidInput(_)));
    let e = store.transact(|tx| tx.create_user(NewUser::new(format!("{}@example.com", long)))).unwrap_err();
    assert!(matches!(e, RbacError::InvalidInput(_)));
    let e = store.transact(|tx| tx.create_user(NewUser::new("a@example.com").username(long.clone()))).unwrap_err();
    assert!(matches!(e, RbacError::InvalidInput(_)));

    let gid = store.transact(|tx| Ok(tx.create_group(NewGroup::new("ops"))?.id)).unwrap();
    let e = store.transact(|tx| tx.create_role(NewRole::new(long.clone(), gid))).unwrap_err();
    assert!(matches!(e, RbacError::InvalidInput(_)));
    let e = store.transact(|tx| tx.update_group(gid, &long, None)).unwrap_err();
    assert!(matches!(e, RbacError::InvalidInput(_)));
}

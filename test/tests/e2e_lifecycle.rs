/// END-TO-END: spawn / despawn / parent cascade / ownership authority
///
/// 1. Authority spawns a player entity for peer A
/// 2. Authority despawns it, every connected peer gets a Despawn
/// 3. Authority spawns a parent & a child, then despawns the parent
/// 4. A client tries to change ownership and is refused
///
/// Every notification is delivered to real client SpawnManagers.

use replica_shared::{
    LifecycleMessage, PeerId, PrefabId, ScopeEvent, SpawnError, SpawnParams, WorldMutType,
};
use replica_test::{
    assert_model_consistent, authority, client, deliver, type_key, TestWorld, CRATE, PLAYER,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn e2e_player_spawn_despawn_and_parent_cascade() {
    init_logging();

    let peer_a = PeerId::new(1);
    let peer_b = PeerId::new(2);

    let mut server = authority();
    let mut server_world = TestWorld::new();
    let mut client_a = client(peer_a);
    let mut world_a = TestWorld::new();
    let mut client_b = client(peer_b);
    let mut world_b = TestWorld::new();

    server.handle_scope_event(&server_world, ScopeEvent::PeerConnected(peer_a));
    server.handle_scope_event(&server_world, ScopeEvent::PeerConnected(peer_b));

    // (1) player entity for A
    let avatar = server_world.create_entity();
    let player = server
        .spawn(
            &mut server_world,
            SpawnParams::new(avatar, type_key(PLAYER)).player_of(peer_a),
        )
        .unwrap();

    assert!(server.has_entity(&player));
    assert_eq!(server.player_entity(&peer_a), Ok(Some(player)));
    assert_eq!(server.entity(&player).unwrap().owner(), Some(peer_a));
    assert_model_consistent!(server);

    let delivered = deliver(
        &mut server,
        &mut [(&mut client_a, &mut world_a), (&mut client_b, &mut world_b)],
    );
    assert_eq!(delivered, 2);
    assert_eq!(client_a.local_player_entity(), Some(player));
    assert_eq!(client_b.local_player_entity(), None);
    let avatar_a = client_a.entity(&player).unwrap().world_entity();
    assert_eq!(world_a.prefab_of(&avatar_a), Some(PrefabId::new(PLAYER)));
    assert_model_consistent!(client_a);

    // (2) despawn, every connected peer is told
    server.despawn(&mut server_world, &player, true).unwrap();

    assert!(!server.has_entity(&player));
    assert_eq!(server.player_entity(&peer_a), Ok(None));
    assert!(server_world.is_destroyed(&avatar));
    assert_eq!(
        server.outgoing_messages(),
        &[
            (peer_a, LifecycleMessage::Despawn(player)),
            (peer_b, LifecycleMessage::Despawn(player)),
        ]
    );
    assert_model_consistent!(server);

    deliver(
        &mut server,
        &mut [(&mut client_a, &mut world_a), (&mut client_b, &mut world_b)],
    );
    assert!(!client_a.has_entity(&player));
    assert_eq!(client_a.local_player_entity(), None);
    assert!(world_a.is_destroyed(&avatar_a));

    // (3) parent despawn moves the child to the root
    let crate_entity = server_world.create_entity();
    let lid_entity = server_world.create_entity();
    let parent = server
        .spawn(&mut server_world, SpawnParams::new(crate_entity, type_key(CRATE)))
        .unwrap();
    let child = server
        .spawn(
            &mut server_world,
            SpawnParams::new(lid_entity, type_key(CRATE)).with_parent(parent),
        )
        .unwrap();
    assert_eq!(server.entity_parent(&child), Some((true, parent)));
    assert_eq!(server_world.engine_parent(&lid_entity), Some(crate_entity));

    deliver(
        &mut server,
        &mut [(&mut client_a, &mut world_a), (&mut client_b, &mut world_b)],
    );
    assert_eq!(client_b.entity_parent(&child), Some((true, parent)));

    server.take_events();
    server.despawn(&mut server_world, &parent, false).unwrap();

    assert_eq!(server.entity_parent(&child), None);
    assert!(server.parenting().children_of(&parent).is_empty());
    assert!(!server.parenting().references(&parent));
    assert_eq!(server_world.engine_parent(&lid_entity), None);
    assert!(!server_world.is_destroyed(&crate_entity));
    let events = server.take_events();
    assert_eq!(events.parent_detaches(), &[(child, parent)]);
    assert_model_consistent!(server);

    deliver(
        &mut server,
        &mut [(&mut client_a, &mut world_a), (&mut client_b, &mut world_b)],
    );
    assert_eq!(client_b.entity_parent(&child), None);
    assert!(client_b.has_entity(&child));
    assert_model_consistent!(client_b);

    // (4) clients never originate ownership changes
    let result = client_b.change_ownership(&child, Some(peer_b));

    assert_eq!(
        result,
        Err(SpawnError::AuthorityViolation {
            operation: "change ownership"
        })
    );
    assert_eq!(client_b.entity(&child).unwrap().owner(), None);
    assert!(client_b.ownership().all_entities().is_empty());
    assert!(client_b.outgoing_messages().is_empty());
    assert!(client_b.take_events().ownership_changes().is_empty());
}

#[test]
fn e2e_client_replays_are_tolerated() {
    init_logging();

    let peer = PeerId::new(1);
    let mut server = authority();
    let mut server_world = TestWorld::new();
    let mut client = client(peer);
    let mut world = TestWorld::new();
    server.handle_scope_event(&server_world, ScopeEvent::PeerConnected(peer));

    let kept = server_world.create_entity();
    let doomed = server_world.create_entity();
    let kept = server
        .spawn(&mut server_world, SpawnParams::new(kept, type_key(CRATE)).owned_by(peer))
        .unwrap();
    let doomed = server
        .spawn(&mut server_world, SpawnParams::new(doomed, type_key(CRATE)))
        .unwrap();

    let spawns = server.take_outgoing_messages();
    for (_, message) in spawns.iter().cloned() {
        client.receive_message(&mut world, message);
    }
    // same spawns again
    for (_, message) in spawns.into_iter() {
        client.receive_message(&mut world, message);
    }
    assert_eq!(client.entity_count(), 2);
    assert_eq!(world.entity_count(), 2);

    server.despawn(&mut server_world, &doomed, true).unwrap();
    let despawns = server.take_outgoing_messages();
    for (_, message) in despawns.iter().cloned() {
        client.receive_message(&mut world, message);
    }
    client.take_events();
    // late duplicate despawn
    for (_, message) in despawns.into_iter() {
        client.receive_message(&mut world, message);
    }

    assert!(!client.has_entity(&doomed));
    assert!(client.has_entity(&kept));
    assert_eq!(client.ownership().owned_entities(&peer), &[kept]);
    assert!(client.take_events().is_empty());
    assert_model_consistent!(client);
}

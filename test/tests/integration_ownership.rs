/// INTEGRATION: ownership transfer on the authority and its replication

use replica_shared::{
    EntityId, LifecycleMessage, NetworkParenting, PeerId, ScopeEvent, SpawnError, SpawnMessage,
    SpawnParams,
};
use replica_test::{
    assert_model_consistent, authority, client, deliver, type_key, TestWorld, CRATE, PLAYER,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn ownership_change_is_exclusive() {
    init_logging();

    let p1 = PeerId::new(1);
    let p2 = PeerId::new(2);
    let mut server = authority();
    let mut world = TestWorld::new();
    let barrel = world.create_entity();
    let entity = server
        .spawn(&mut world, SpawnParams::new(barrel, type_key(CRATE)))
        .unwrap();

    server.change_ownership(&entity, Some(p1)).unwrap();
    server.change_ownership(&entity, Some(p2)).unwrap();

    assert!(server.ownership().owned_entities(&p1).is_empty());
    assert_eq!(server.ownership().owned_entities(&p2), &[entity]);
    assert_eq!(server.entity(&entity).unwrap().owner(), Some(p2));
    assert!(server.entity(&entity).unwrap().is_owned_by(&p2));

    let events = server.take_events();
    assert_eq!(
        events.ownership_changes(),
        &[(entity, Some(p1)), (entity, Some(p2))]
    );
    assert_model_consistent!(server);
}

#[test]
fn repeated_ownership_change_keeps_one_entry() {
    let owner = PeerId::new(4);
    let mut server = authority();
    let mut world = TestWorld::new();
    let barrel = world.create_entity();
    let entity = server
        .spawn(
            &mut world,
            SpawnParams::new(barrel, type_key(CRATE)).owned_by(owner),
        )
        .unwrap();

    server.change_ownership(&entity, Some(owner)).unwrap();
    server.change_ownership(&entity, Some(owner)).unwrap();

    assert_eq!(server.ownership().owned_entities(&owner), &[entity]);
    assert_model_consistent!(server);
}

#[test]
fn player_entity_moves_between_player_slots() {
    let p1 = PeerId::new(1);
    let p2 = PeerId::new(2);
    let mut server = authority();
    let mut world = TestWorld::new();
    let avatar = world.create_entity();
    let player = server
        .spawn(
            &mut world,
            SpawnParams::new(avatar, type_key(PLAYER)).player_of(p1),
        )
        .unwrap();

    server.change_ownership(&player, Some(p2)).unwrap();

    assert_eq!(server.player_entity(&p1), Ok(None));
    assert_eq!(server.player_entity(&p2), Ok(Some(player)));
    assert!(server.ownership().owned_entities(&p2).is_empty());
    assert_model_consistent!(server);

    server.remove_ownership(&player).unwrap();

    assert_eq!(server.player_entity(&p2), Ok(None));
    assert_eq!(server.entity(&player).unwrap().owner(), None);
    assert!(server.ownership().all_entities().is_empty());
    assert_model_consistent!(server);
}

#[test]
fn second_player_entity_for_a_peer_is_refused() {
    let peer = PeerId::new(1);
    let mut server = authority();
    let mut world = TestWorld::new();
    let avatar = world.create_entity();
    let first = server
        .spawn(
            &mut world,
            SpawnParams::new(avatar, type_key(PLAYER)).player_of(peer),
        )
        .unwrap();
    let spare_avatar = world.create_entity();

    let result = server.spawn(
        &mut world,
        SpawnParams::new(spare_avatar, type_key(PLAYER)).player_of(peer),
    );

    assert_eq!(
        result,
        Err(SpawnError::PlayerSlotTaken {
            owner: peer,
            entity: first
        })
    );
    assert_eq!(server.entity_id(&spare_avatar), None);
    assert_eq!(server.player_entity(&peer), Ok(Some(first)));
    assert!(server.entity(&first).unwrap().is_player_entity());
    assert_model_consistent!(server);

    // a plain owned entity for the same peer is still fine
    let sword = world.create_entity();
    let owned = server
        .spawn(
            &mut world,
            SpawnParams::new(sword, type_key(CRATE)).owned_by(peer),
        )
        .unwrap();
    assert_eq!(server.ownership().owned_entities(&peer), &[owned]);
    assert_model_consistent!(server);
}

#[test]
fn player_entity_cannot_move_into_a_taken_player_slot() {
    let p1 = PeerId::new(1);
    let p2 = PeerId::new(2);
    let mut server = authority();
    let mut world = TestWorld::new();
    server.handle_scope_event(&world, ScopeEvent::PeerConnected(p1));
    let avatar_1 = world.create_entity();
    let player_1 = server
        .spawn(
            &mut world,
            SpawnParams::new(avatar_1, type_key(PLAYER)).player_of(p1),
        )
        .unwrap();
    let avatar_2 = world.create_entity();
    let player_2 = server
        .spawn(
            &mut world,
            SpawnParams::new(avatar_2, type_key(PLAYER)).player_of(p2),
        )
        .unwrap();
    server.take_outgoing_messages();
    server.take_events();

    assert_eq!(
        server.change_ownership(&player_1, Some(p2)),
        Err(SpawnError::PlayerSlotTaken {
            owner: p2,
            entity: player_2
        })
    );

    assert_eq!(server.entity(&player_1).unwrap().owner(), Some(p1));
    assert_eq!(server.player_entity(&p1), Ok(Some(player_1)));
    assert_eq!(server.player_entity(&p2), Ok(Some(player_2)));
    assert!(server.outgoing_messages().is_empty());
    assert!(server.take_events().is_empty());
    assert_model_consistent!(server);
}

#[test]
fn client_demotes_player_entity_replaced_by_inbound_spawn() {
    init_logging();

    let peer = PeerId::new(1);
    let mut client = client(peer);
    let mut world = TestWorld::new();
    let player_spawn = |id: u64| {
        LifecycleMessage::Spawn(SpawnMessage {
            is_player_entity: true,
            entity_id: EntityId::from_u64(id),
            owner: Some(peer),
            parent: None,
            is_scene_entity: false,
            type_key: type_key(PLAYER),
            transform: None,
            parenting: NetworkParenting::default(),
            field_state: None,
        })
    };
    let (first, second) = (EntityId::from_u64(1), EntityId::from_u64(2));

    client.receive_message(&mut world, player_spawn(1));
    client.receive_message(&mut world, player_spawn(2));

    assert_eq!(client.local_player_entity(), Some(second));
    assert_eq!(client.ownership().owned_entities(&peer), &[first]);
    let demoted = client.entity(&first).unwrap();
    assert!(!demoted.is_player_entity());
    assert_eq!(demoted.owner(), Some(peer));
    assert_model_consistent!(client);

    // the demoted entity is despawned as a plain owned entity
    client.receive_message(&mut world, LifecycleMessage::Despawn(first));
    assert!(client.ownership().owned_entities(&peer).is_empty());
    assert_eq!(client.local_player_entity(), Some(second));
    assert_model_consistent!(client);
}

#[test]
fn ownership_changes_replicate_to_connected_peers() {
    init_logging();

    let p1 = PeerId::new(1);
    let p2 = PeerId::new(2);
    let mut server = authority();
    let mut server_world = TestWorld::new();
    let mut client_1 = client(p1);
    let mut world_1 = TestWorld::new();
    let mut client_2 = client(p2);
    let mut world_2 = TestWorld::new();
    server.handle_scope_event(&server_world, ScopeEvent::PeerConnected(p1));
    server.handle_scope_event(&server_world, ScopeEvent::PeerConnected(p2));

    let barrel = server_world.create_entity();
    let entity = server
        .spawn(
            &mut server_world,
            SpawnParams::new(barrel, type_key(CRATE)).owned_by(p1),
        )
        .unwrap();
    deliver(
        &mut server,
        &mut [(&mut client_1, &mut world_1), (&mut client_2, &mut world_2)],
    );
    assert_eq!(client_1.ownership().owned_entities(&p1), &[entity]);

    server.change_ownership(&entity, Some(p2)).unwrap();
    assert_eq!(
        server.outgoing_messages(),
        &[
            (p1, LifecycleMessage::OwnershipChange(entity, Some(p2))),
            (p2, LifecycleMessage::OwnershipChange(entity, Some(p2))),
        ]
    );
    deliver(
        &mut server,
        &mut [(&mut client_1, &mut world_1), (&mut client_2, &mut world_2)],
    );

    for client in [&client_1, &client_2] {
        assert!(client.ownership().owned_entities(&p1).is_empty());
        assert_eq!(client.ownership().owned_entities(&p2), &[entity]);
        assert_eq!(client.entity(&entity).unwrap().owner(), Some(p2));
        assert_model_consistent!(*client);
    }
}

#[test]
fn client_ignores_ownership_change_of_unknown_entity() {
    let mut client = client(PeerId::new(1));
    let mut world = TestWorld::new();

    client.receive_message(
        &mut world,
        LifecycleMessage::OwnershipChange(EntityId::from_u64(8), Some(PeerId::new(1))),
    );

    assert!(client.ownership().all_entities().is_empty());
    assert!(client.take_events().is_empty());
}

#[test]
fn authority_ignores_inbound_notifications() {
    let mut server = authority();
    let mut world = TestWorld::new();
    let barrel = world.create_entity();
    let entity = server
        .spawn(&mut world, SpawnParams::new(barrel, type_key(CRATE)))
        .unwrap();
    server.take_events();

    server.receive_message(&mut world, LifecycleMessage::Despawn(entity));
    server.receive_message(
        &mut world,
        LifecycleMessage::OwnershipChange(entity, Some(PeerId::new(1))),
    );

    assert!(server.has_entity(&entity));
    assert_eq!(server.entity(&entity).unwrap().owner(), None);
    assert!(server.take_events().is_empty());
}

//! Property-set round trips through `NetData`.

use bitstream::{BitReader, BitWriter};
use demo_layout::{ship_layout, Ship};
use proptest::prelude::*;
use replication::{NetData, ReplicationError};
use wire::NetId;

fn ship_net(id: u32) -> (NetData<Ship>, Ship) {
    let mut net = NetData::new(ship_layout()).unwrap();
    let mut ship = Ship::default();
    net.bind(&mut ship, NetId::new(id)).unwrap();
    (net, ship)
}

fn replicated_fields(ship: &Ship) -> (String, (i32, i32), (i16, i16), u16, u16, u8, bool, u32) {
    (
        ship.name.clone(),
        ship.pos,
        ship.vel,
        ship.yaw,
        ship.health,
        ship.ammo,
        ship.shielded,
        ship.last_target,
    )
}

prop_compose! {
    fn arb_ship()(
        name in "[A-Za-z ]{0,16}",
        pos in (any::<i32>(), any::<i32>()),
        vel in (any::<i16>(), any::<i16>()),
        yaw in 0u16..4096,
        health in any::<u16>(),
        ammo in any::<u8>(),
        shielded in any::<bool>(),
        last_target in any::<u32>(),
    ) -> Ship {
        Ship { name, pos, vel, yaw, health, ammo, shielded, last_target, ..Ship::default() }
    }
}

proptest! {
    #[test]
    fn prop_serialize_deserialize_roundtrip(source in arb_ship()) {
        let (host, _) = ship_net(1);
        let (mut peer, mut mirror) = ship_net(1);

        let mut out = BitWriter::new();
        host.serialize(&source, &mut out).unwrap();
        let bytes = out.finish();

        let mut input = BitReader::new(&bytes);
        peer.deserialize(&mut mirror, &mut input).unwrap();
        prop_assert_eq!(input.whole_bytes_remaining(), 0);
        prop_assert_eq!(replicated_fields(&mirror), replicated_fields(&source));
    }

    #[test]
    fn prop_truncated_state_never_applies(source in arb_ship(), cut in 0usize..64) {
        let (host, _) = ship_net(1);
        let (mut peer, mut mirror) = ship_net(1);
        let bytes = host.snapshot(&source).unwrap();
        let cut = cut.min(bytes.len().saturating_sub(1));

        let before = replicated_fields(&mirror);
        let result = peer.apply_state(&mut mirror, &bytes[..cut]);
        prop_assert!(matches!(result, Err(ReplicationError::Decode(_))));
        prop_assert_eq!(replicated_fields(&mirror), before);
        prop_assert_eq!(peer.stats().state_decode_failures, 1);
    }
}

#[test]
fn apply_state_roundtrip_keeps_local_fields() {
    let (host, _) = ship_net(3);
    let (mut peer, mut mirror) = ship_net(3);
    mirror.confirmed_hits = 4;
    let source = Ship::new("Kestrel", (10, -20));

    peer.apply_state(&mut mirror, &host.snapshot(&source).unwrap())
        .unwrap();

    assert_eq!(replicated_fields(&mirror), replicated_fields(&source));
    assert_eq!(mirror.confirmed_hits, 4);
    assert!(mirror.fire.is_bound());
}

#![no_main]

use demo_layout::{ship_layout, Ship};
use libfuzzer_sys::fuzz_target;
use replication::{NetRegistry, NetRole, ReplicationConfig};
use wire::NetId;

fuzz_target!(|data: &[u8]| {
    // Skip the hash check so payloads reach the layout decoders.
    let config = ReplicationConfig {
        verify_layout_hash: false,
        ..ReplicationConfig::for_testing()
    };
    let mut registry = NetRegistry::new(config);
    for raw in 0..4 {
        let role = if raw == 0 {
            NetRole::AuthoritativeProxy
        } else {
            NetRole::SimulatedProxy
        };
        let _ = registry.spawn(NetId::new(raw), Ship::default(), ship_layout(), role, NetRole::Authority);
    }

    let mut idx = 0usize;
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 120).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let _ = registry.receive_frame(&data[idx..end]);
        idx = end;
    }
});

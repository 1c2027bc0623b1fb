#![no_main]

use demo_layout::{ship_layout, Ship};
use layout::decode_value;
use libfuzzer_sys::fuzz_target;
use replication::NetData;
use wire::NetId;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };

    // RPC argument shapes used by the demo layout, plus the nested ones.
    match selector % 6 {
        0 => drop(decode_value::<(i16, i16)>(payload)),
        1 => drop(decode_value::<u32>(payload)),
        2 => drop(decode_value::<String>(payload)),
        3 => drop(decode_value::<Vec<(u8, bool)>>(payload)),
        4 => drop(decode_value::<(f32, Vec<String>, i64)>(payload)),
        _ => {
            let Ok(mut net) = NetData::new(ship_layout()) else {
                return;
            };
            let mut ship = Ship::default();
            if net.bind(&mut ship, NetId::new(1)).is_err() {
                return;
            }
            let before = ship.clone();
            if net.apply_state(&mut ship, payload).is_err() {
                assert_eq!(ship, before, "rejected state must not be applied");
            }
        }
    }
});

use bitstream::BitWriter;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use demo_layout::{ship_layout, Ship};
use replication::{LoopbackTransport, NetData, NetRole};
use wire::NetId;

fn bound_ship() -> (NetData<Ship>, Ship) {
    let mut net = NetData::new(ship_layout()).unwrap();
    let mut ship = Ship::new("Kestrel", (1200, -340));
    ship.vel = (12, -4);
    net.bind(&mut ship, NetId::new(1)).unwrap();
    (net, ship)
}

#[allow(clippy::unwrap_used)]
fn bench_ship_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("ship_state");
    let (net, ship) = bound_ship();
    let bytes = net.snapshot(&ship).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("serialize", |b| {
        b.iter(|| {
            let mut out = BitWriter::with_capacity(64);
            net.serialize(&ship, &mut out).unwrap();
            out.finish()
        })
    });

    group.bench_function("apply_state", |b| {
        let (mut peer, mut mirror) = bound_ship();
        b.iter(|| peer.apply_state(&mut mirror, &bytes).unwrap())
    });

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_rpc_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("rpc_dispatch");

    group.bench_function("server_rpc_local", |b| {
        b.iter_batched(
            || {
                let (mut net, ship) = bound_ship();
                net.set_role(NetRole::Authority).unwrap();
                (net, ship, LoopbackTransport::authority())
            },
            |(mut net, mut ship, mut transport)| {
                let sender = ship.thrust;
                sender.send_server(&mut net, &mut ship, &mut transport, &(1i16, 1i16));
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("server_rpc_remote", |b| {
        let (mut net, mut ship) = bound_ship();
        net.set_role(NetRole::AuthoritativeProxy).unwrap();
        let mut transport = LoopbackTransport::remote();
        b.iter(|| {
            let sender = ship.fire;
            sender.send_server(&mut net, &mut ship, &mut transport, &7u32);
            transport.take_sent()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_ship_state, bench_rpc_dispatch);
criterion_main!(benches);

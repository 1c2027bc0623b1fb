//! RPC dispatch: short-circuit, forwarding, role gating, unknown ids.

use layout::{encode_value, Property, RepLayout};
use replication::{LoopbackTransport, NetData, NetRole, Rpc, RpcMessage, RpcSender};
use wire::{NetId, RpcId, RpcType};

#[derive(Debug, Default, Clone, PartialEq)]
struct Counter {
    value: i32,
    label: String,
    add: RpcSender,
    reset: RpcSender,
    announce: RpcSender,
    announced: Vec<i32>,
}

fn counter_layout() -> RepLayout<Counter> {
    RepLayout::new()
        .property(Property::new("value", |c: &Counter| &c.value, |c| &mut c.value))
        .property(Property::new("label", |c: &Counter| &c.label, |c| &mut c.label))
        .rpc(Rpc::server("add", |c: &mut Counter| &mut c.add, |c: &mut Counter, n: i32| c.value += n))
        .rpc(Rpc::server("reset", |c: &mut Counter| &mut c.reset, |c: &mut Counter, (): ()| c.value = 0))
        .rpc(Rpc::client(
            "announce",
            |c: &mut Counter| &mut c.announce,
            |c: &mut Counter, n: i32| c.announced.push(n),
        ))
}

const ENTITY: NetId = NetId::new(42);

fn bound(role: NetRole) -> (NetData<Counter>, Counter) {
    let mut net = NetData::new(counter_layout()).unwrap();
    let mut state = Counter::default();
    net.bind(&mut state, ENTITY).unwrap();
    net.set_role(role).unwrap();
    (net, state)
}

#[test]
fn authority_process_runs_server_rpc_locally_once() {
    let (mut net, mut state) = bound(NetRole::SimulatedProxy);
    let mut transport = LoopbackTransport::authority();
    let payload = encode_value(&5i32).unwrap();

    net.send_rpc(&mut state, &mut transport, RpcId::new(0), RpcType::Server, &payload);

    assert_eq!(state.value, 5);
    assert!(transport.sent().is_empty());
    assert_eq!(net.stats().rpcs_local, 1);
    assert_eq!(net.stats().rpcs_received, 1);
    assert_eq!(net.stats().rpcs_remote, 0);
}

#[test]
fn remote_process_forwards_server_rpc_once() {
    let (mut net, mut state) = bound(NetRole::AuthoritativeProxy);
    let mut transport = LoopbackTransport::remote();
    let payload = encode_value(&5i32).unwrap();

    net.send_rpc(&mut state, &mut transport, RpcId::new(0), RpcType::Server, &payload);

    assert_eq!(state.value, 0);
    assert_eq!(
        transport.sent(),
        &[RpcMessage {
            entity: ENTITY,
            rpc_id: RpcId::new(0),
            rpc_type: RpcType::Server,
            payload,
            layout_hash: net.layout_hash(),
        }]
    );
    assert_eq!(net.stats().rpcs_received, 0);
}

#[test]
fn unknown_rpc_id_is_dropped_without_mutation() {
    let (mut net, mut state) = bound(NetRole::Authority);
    state.value = 9;
    let before = state.clone();

    net.receive_rpc(&mut state, RpcId::new(999), &[1, 2, 3]);

    assert_eq!(state, before);
    assert_eq!(net.stats().unknown_rpcs, 1);
    assert_eq!(net.stats().rpcs_received, 0);
}

#[test]
fn undecodable_payload_is_dropped_without_mutation() {
    let (mut net, mut state) = bound(NetRole::Authority);
    net.receive_rpc(&mut state, RpcId::new(0), &[1]);
    assert_eq!(state.value, 0);
    assert_eq!(net.stats().rpc_decode_failures, 1);
}

#[test]
fn client_rpc_from_simulated_proxy_is_rejected() {
    let (mut net, mut state) = bound(NetRole::SimulatedProxy);
    let mut transport = LoopbackTransport::remote();
    let sender = state.announce;

    sender.send_client(&mut net, &mut state, &mut transport, &3i32);

    assert!(transport.sent().is_empty());
    assert!(state.announced.is_empty());
    assert_eq!(net.stats().role_rejections, 1);
    assert_eq!(net.stats().warnings(), 1);
}

#[test]
fn client_rpc_from_authoritative_proxy_short_circuits() {
    let (mut net, mut state) = bound(NetRole::AuthoritativeProxy);
    let mut transport = LoopbackTransport::remote();
    let sender = state.announce;

    sender.send_client(&mut net, &mut state, &mut transport, &3i32);

    assert!(transport.sent().is_empty());
    assert_eq!(state.announced, vec![3]);
    assert_eq!(net.stats().rpcs_local, 1);
}

#[test]
fn authority_sends_client_rpc_to_owner() {
    let (mut net, mut state) = bound(NetRole::Authority);
    let mut transport = LoopbackTransport::authority();
    let sender = state.announce;

    sender.send_to_owner(&mut net, &mut state, &mut transport, &8i32);

    assert!(state.announced.is_empty());
    assert_eq!(transport.sent().len(), 1);
    assert_eq!(transport.sent()[0].rpc_type, RpcType::Client);
    assert_eq!(net.stats().rpcs_remote, 1);
}

#[test]
fn net_data_forwards_server_rpc_off_host_whatever_the_role() {
    for role in [NetRole::Authority, NetRole::AuthoritativeProxy, NetRole::SimulatedProxy] {
        let (mut net, mut state) = bound(role);
        let mut transport = LoopbackTransport::remote();
        let payload = encode_value(&5i32).unwrap();

        net.send_rpc(&mut state, &mut transport, RpcId::new(0), RpcType::Server, &payload);

        assert_eq!(transport.sent().len(), 1, "{role}");
        assert_eq!(state.value, 0, "{role}");
        assert_eq!(net.stats().rpcs_local, 0, "{role}");
    }
}

#[test]
fn authority_sender_runs_server_rpc_in_process() {
    let (mut net, mut state) = bound(NetRole::Authority);
    let mut transport = LoopbackTransport::remote();
    let sender = state.add;

    sender.send_server(&mut net, &mut state, &mut transport, &4i32);

    assert_eq!(state.value, 4);
    assert!(transport.sent().is_empty());
    assert_eq!(net.stats().rpcs_local, 1);
}

#[test]
fn server_rpc_sender_is_not_role_gated() {
    let (mut net, mut state) = bound(NetRole::SimulatedProxy);
    let mut transport = LoopbackTransport::remote();
    let sender = state.reset;

    sender.send_server(&mut net, &mut state, &mut transport, &());

    assert_eq!(transport.sent().len(), 1);
    assert_eq!(net.stats().role_rejections, 0);
}

#[test]
fn senders_are_stamped_in_layout_order() {
    let (_, state) = bound(NetRole::Authority);
    assert_eq!(state.add, RpcSender::bound(ENTITY, RpcId::new(0)));
    assert_eq!(state.reset, RpcSender::bound(ENTITY, RpcId::new(1)));
    assert_eq!(state.announce, RpcSender::bound(ENTITY, RpcId::new(2)));
}

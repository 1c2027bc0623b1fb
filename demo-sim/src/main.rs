use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use demo_layout::{ship_layout, ship_manifest, Ship, POS_MAX, POS_MIN};
use layout::LayoutManifest;
use log::{debug, info};
use replication::{
    ChannelTransport, FrameSink, NetRegistry, NetRole, NetStats, RegistryStats, ReplicationConfig,
};
use serde::Serialize;
use wire::NetId;

#[derive(Parser)]
#[command(
    name = "demo-sim",
    version,
    about = "Deterministic host/client replication demo"
)]
struct Cli {
    /// Number of ships; the client owns the first one.
    #[arg(long, default_value_t = 8)]
    ships: u32,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 300)]
    ticks: u32,
    /// RNG seed for deterministic results.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// The owned ship fires every N ticks.
    #[arg(long, default_value_t = 10)]
    fire_every: u32,
    /// Output directory for the manifest and summary.
    #[arg(long, default_value = "captures")]
    out_dir: PathBuf,
    /// Fail if the average state frame size exceeds this value.
    #[arg(long)]
    max_avg_state_bytes: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = ReplicationConfig::default();

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create output dir {}", cli.out_dir.display()))?;
    let manifest = ship_manifest().context("describe ship layout")?;
    write_manifest_json(&cli.out_dir, &manifest)?;

    let (mut host_link, mut client_link) = ChannelTransport::pair(config.limits.clone());
    let mut host = NetRegistry::new(config.clone());
    let mut client = NetRegistry::new(config);
    let mut rng = Rng::new(cli.seed);
    let owned = NetId::new(1);
    spawn_ships(&mut host, &mut client, cli.ships, owned, &mut rng)?;

    let mut summary = Summary::new(&cli);
    for tick in 1..=cli.ticks {
        client_input(&mut client, &mut client_link, owned, tick, cli.fire_every, &mut rng)?;
        let report = host.drain(&mut host_link);
        debug!("tick {tick}: host applied {} frames", report.applied);

        step_host(&mut host, &mut host_link, owned, &mut rng);

        let mut metered = Metered::new(&mut host_link);
        host.publish_state(tick, &mut metered);
        summary.push_state_frames(&metered.sizes);

        client.drain(&mut client_link);
        validate_mirrors(&host, &client, tick)?;
    }

    summary.finalize(&host, &client);
    summary.assert_budget(cli.max_avg_state_bytes)?;
    write_summary_json(&cli.out_dir, &summary)?;
    info!(
        "simulated {} ticks: {} state frames, {} rpcs, {} warnings",
        summary.ticks, summary.state_frames, summary.rpcs_remote, summary.warnings
    );
    Ok(())
}

fn spawn_ships(
    host: &mut NetRegistry<Ship>,
    client: &mut NetRegistry<Ship>,
    count: u32,
    owned: NetId,
    rng: &mut Rng,
) -> Result<()> {
    for raw in 1..=count {
        let id = NetId::new(raw);
        let pos = (
            rng.range_i32(POS_MIN / 2, POS_MAX / 2),
            rng.range_i32(POS_MIN / 2, POS_MAX / 2),
        );
        let (client_role, remote_role) = if id == owned {
            (NetRole::AuthoritativeProxy, NetRole::AuthoritativeProxy)
        } else {
            (NetRole::SimulatedProxy, NetRole::SimulatedProxy)
        };
        host.spawn(id, Ship::new(format!("ship-{raw}"), pos), ship_layout(), NetRole::Authority, remote_role)
            .with_context(|| format!("spawn {id} on host"))?;
        client
            .spawn(id, Ship::default(), ship_layout(), client_role, NetRole::Authority)
            .with_context(|| format!("spawn {id} on client"))?;
    }
    Ok(())
}

fn client_input(
    client: &mut NetRegistry<Ship>,
    link: &mut ChannelTransport,
    owned: NetId,
    tick: u32,
    fire_every: u32,
    rng: &mut Rng,
) -> Result<()> {
    if rng.next_u32() % 4 == 0 {
        let thrust = (rng.range_i16(-20, 20), rng.range_i16(-20, 20));
        client.send_server(owned, |s| s.thrust, link, &thrust)?;
    }
    if fire_every > 0 && tick % fire_every == 0 {
        let target = 2 + rng.next_u32() % client.len().max(1) as u32;
        client.send_server(owned, |s| s.fire, link, &target)?;
    }
    if tick % 97 == 0 {
        client.send_server(owned, |s| s.toggle_shield, link, &())?;
    }
    Ok(())
}

fn step_host(host: &mut NetRegistry<Ship>, link: &mut ChannelTransport, owned: NetId, rng: &mut Rng) {
    let ids: Vec<NetId> = host.iter().map(|entity| entity.id()).collect();
    for id in ids {
        let Some(entity) = host.get_mut(id) else {
            continue;
        };
        if id != owned && rng.next_u32() % 20 == 0 {
            entity.state.vel = (rng.range_i16(-50, 50), rng.range_i16(-50, 50));
        }
        entity.state.step();
    }

    // Resolve the owned ship's latest shot against its target.
    let Some(target) = host.get(owned).map(|ship| NetId::new(ship.state.last_target)) else {
        return;
    };
    if target == owned || target.raw() == 0 {
        return;
    }
    let damage = 10 + (rng.next_u32() % 40) as u16;
    if let Some(victim) = host.get_mut(target) {
        victim.state.damage(damage);
    } else {
        return;
    }
    if let Some(shooter) = host.get_mut(owned) {
        shooter.state.last_target = 0;
        shooter.send_to_owner(|s| s.hit_confirmed, link, &damage);
    }
}

fn validate_mirrors(host: &NetRegistry<Ship>, client: &NetRegistry<Ship>, tick: u32) -> Result<()> {
    for entity in host.iter() {
        let mirror = client
            .get(entity.id())
            .with_context(|| format!("client is missing {}", entity.id()))?;
        let expected = entity.net.snapshot(&entity.state)?;
        let actual = mirror.net.snapshot(&mirror.state)?;
        if expected != actual {
            anyhow::bail!("{} diverged at tick {tick}", entity.id());
        }
    }
    Ok(())
}

/// Frame sink that records the size of every frame it forwards.
struct Metered<'a> {
    inner: &'a mut ChannelTransport,
    sizes: Vec<u64>,
}

impl<'a> Metered<'a> {
    fn new(inner: &'a mut ChannelTransport) -> Self {
        Self {
            inner,
            sizes: Vec::new(),
        }
    }
}

impl FrameSink for Metered<'_> {
    fn send_frame(&mut self, frame: Vec<u8>) {
        self.sizes.push(frame.len() as u64);
        self.inner.send_frame(frame);
    }
}

fn write_manifest_json(out_dir: &Path, manifest: &LayoutManifest) -> Result<()> {
    let path = out_dir.join("manifest.json");
    let contents = serde_json::to_string_pretty(manifest).context("serialize manifest")?;
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn write_summary_json(out_dir: &Path, summary: &Summary) -> Result<()> {
    let path = out_dir.join("summary.json");
    let contents = serde_json::to_string_pretty(summary).context("serialize summary")?;
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        let span = u64::from(min.abs_diff(max)) + 1;
        let value = u64::from(self.next_u32()) % span;
        (i64::from(min) + value as i64) as i32
    }

    fn range_i16(&mut self, min: i16, max: i16) -> i16 {
        self.range_i32(i32::from(min), i32::from(max)) as i16
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    ships: u32,
    ticks: u32,
    seed: u64,
    state_frames: u64,
    state_bytes_total: u64,
    avg_state_bytes: u64,
    p95_state_bytes: u64,
    rpcs_remote: u64,
    rpcs_received: u64,
    confirmed_hits: u32,
    warnings: u64,
    host_inbound: InboundSummary,
    client_inbound: InboundSummary,
    #[serde(skip)]
    state_sizes: Vec<u64>,
}

#[derive(Debug, Default, Serialize)]
struct InboundSummary {
    frames_applied: u64,
    malformed_frames: u64,
    unknown_entities: u64,
    layout_mismatches: u64,
}

impl From<&RegistryStats> for InboundSummary {
    fn from(stats: &RegistryStats) -> Self {
        Self {
            frames_applied: stats.frames_applied,
            malformed_frames: stats.malformed_frames,
            unknown_entities: stats.unknown_entities,
            layout_mismatches: stats.layout_mismatches,
        }
    }
}

impl Summary {
    fn new(cli: &Cli) -> Self {
        Self {
            ships: cli.ships,
            ticks: cli.ticks,
            seed: cli.seed,
            state_frames: 0,
            state_bytes_total: 0,
            avg_state_bytes: 0,
            p95_state_bytes: 0,
            rpcs_remote: 0,
            rpcs_received: 0,
            confirmed_hits: 0,
            warnings: 0,
            host_inbound: InboundSummary::default(),
            client_inbound: InboundSummary::default(),
            state_sizes: Vec::new(),
        }
    }

    fn push_state_frames(&mut self, sizes: &[u64]) {
        self.state_frames += sizes.len() as u64;
        self.state_bytes_total += sizes.iter().sum::<u64>();
        self.state_sizes.extend_from_slice(sizes);
    }

    fn finalize(&mut self, host: &NetRegistry<Ship>, client: &NetRegistry<Ship>) {
        let mut totals = NetStats::default();
        totals.merge(&host.total_stats());
        totals.merge(&client.total_stats());
        self.rpcs_remote = totals.rpcs_remote;
        self.rpcs_received = totals.rpcs_received;
        self.warnings = totals.warnings();
        self.confirmed_hits = client.iter().map(|entity| entity.state.confirmed_hits).sum();
        self.host_inbound = host.stats().into();
        self.client_inbound = client.stats().into();

        if self.state_frames > 0 {
            self.avg_state_bytes = self.state_bytes_total / self.state_frames;
            self.state_sizes.sort_unstable();
            let idx = ((self.state_sizes.len() as f64) * 0.95).ceil() as usize;
            let idx = idx.saturating_sub(1).min(self.state_sizes.len() - 1);
            self.p95_state_bytes = self.state_sizes[idx];
        }
    }

    fn assert_budget(&self, max_avg: Option<u64>) -> Result<()> {
        if let Some(max_avg) = max_avg {
            if self.avg_state_bytes > max_avg {
                anyhow::bail!(
                    "avg state bytes {} exceeds budget {}",
                    self.avg_state_bytes,
                    max_avg
                );
            }
        }
        Ok(())
    }
}

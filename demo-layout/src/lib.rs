//! Demo ship entity and its replication layout for the reference simulation.
//!
//! The layout is composed from three parts in a fixed order:
//! movement, then combat, then identity. Both peers call [`ship_layout`],
//! so RPC ids and the layout hash agree.

use layout::{LayoutManifest, LayoutResult, Property, RepLayout};
use replication::{Rpc, RpcSender};

pub const POS_MIN: i32 = -100_000;
pub const POS_MAX: i32 = 100_000;
pub const VEL_MAX: i16 = 400;
pub const MAX_HEALTH: u16 = 1000;
pub const MAX_AMMO: u8 = 50;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ship {
    pub name: String,
    pub pos: (i32, i32),
    pub vel: (i16, i16),
    pub yaw: u16,
    pub health: u16,
    pub ammo: u8,
    pub shielded: bool,
    /// Target of the most recent shot.
    pub last_target: u32,
    /// Hits confirmed to the owning client. Not replicated.
    pub confirmed_hits: u32,
    pub thrust: RpcSender,
    pub fire: RpcSender,
    pub toggle_shield: RpcSender,
    pub hit_confirmed: RpcSender,
}

impl Ship {
    #[must_use]
    pub fn new(name: impl Into<String>, pos: (i32, i32)) -> Self {
        Self {
            name: name.into(),
            pos,
            health: MAX_HEALTH,
            ammo: MAX_AMMO,
            ..Self::default()
        }
    }

    /// Advances the ship by one tick. Only the authority steps ships.
    pub fn step(&mut self) {
        self.pos.0 = integrate(self.pos.0, self.vel.0);
        self.pos.1 = integrate(self.pos.1, self.vel.1);
        if self.pos.0 == POS_MIN || self.pos.0 == POS_MAX {
            self.vel.0 = -self.vel.0;
        }
        if self.pos.1 == POS_MIN || self.pos.1 == POS_MAX {
            self.vel.1 = -self.vel.1;
        }
        self.yaw = (self.yaw + 7) % 4096;
    }

    /// Applies damage, honoring the shield.
    pub fn damage(&mut self, amount: u16) {
        let amount = if self.shielded { amount / 4 } else { amount };
        self.health = self.health.saturating_sub(amount);
    }
}

fn integrate(pos: i32, vel: i16) -> i32 {
    pos.saturating_add(i32::from(vel)).clamp(POS_MIN, POS_MAX)
}

fn apply_thrust(ship: &mut Ship, (dx, dy): (i16, i16)) {
    ship.vel.0 = ship.vel.0.saturating_add(dx).clamp(-VEL_MAX, VEL_MAX);
    ship.vel.1 = ship.vel.1.saturating_add(dy).clamp(-VEL_MAX, VEL_MAX);
}

fn fire(ship: &mut Ship, target: u32) {
    if ship.ammo == 0 {
        return;
    }
    ship.ammo -= 1;
    ship.last_target = target;
}

/// Position, velocity and heading, plus the thrust RPC.
#[must_use]
pub fn movement_layout() -> RepLayout<Ship> {
    RepLayout::new()
        .property(Property::new("pos", |s: &Ship| &s.pos, |s| &mut s.pos))
        .property(Property::new("vel", |s: &Ship| &s.vel, |s| &mut s.vel))
        .property(Property::new("yaw", |s: &Ship| &s.yaw, |s| &mut s.yaw))
        .rpc(Rpc::server("thrust", |s: &mut Ship| &mut s.thrust, apply_thrust))
}

/// Health, ammo and shield, plus the combat RPCs.
#[must_use]
pub fn combat_layout() -> RepLayout<Ship> {
    RepLayout::new()
        .property(Property::new("health", |s: &Ship| &s.health, |s| &mut s.health))
        .property(Property::new("ammo", |s: &Ship| &s.ammo, |s| &mut s.ammo))
        .property(Property::new("shielded", |s: &Ship| &s.shielded, |s| &mut s.shielded))
        .property(Property::new("last_target", |s: &Ship| &s.last_target, |s| &mut s.last_target))
        .rpc(Rpc::server("fire", |s: &mut Ship| &mut s.fire, fire))
        .rpc(Rpc::server(
            "toggle_shield",
            |s: &mut Ship| &mut s.toggle_shield,
            |s: &mut Ship, (): ()| s.shielded = !s.shielded,
        ))
        .rpc(Rpc::client(
            "hit_confirmed",
            |s: &mut Ship| &mut s.hit_confirmed,
            |s: &mut Ship, _damage: u16| s.confirmed_hits += 1,
        ))
}

/// Display name.
#[must_use]
pub fn identity_layout() -> RepLayout<Ship> {
    RepLayout::new().property(Property::new("name", |s: &Ship| &s.name, |s| &mut s.name))
}

/// The full ship layout.
#[must_use]
pub fn ship_layout() -> RepLayout<Ship> {
    movement_layout() + combat_layout() + identity_layout()
}

/// Manifest of [`ship_layout`].
pub fn ship_manifest() -> LayoutResult<LayoutManifest> {
    ship_layout().manifest()
}

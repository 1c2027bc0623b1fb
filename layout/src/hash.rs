//! Deterministic layout hashing.

use blake3::Hasher;

use crate::manifest::LayoutManifest;
use crate::replicated::ValueKind;

const DOMAIN: &[u8] = b"netrep-layout-v1";

/// Computes a deterministic hash of a layout's wire shape.
///
/// Two layouts hash equal only if they list the same properties and RPCs in
/// the same order, so peers that composed their layouts differently can be
/// told apart before any payload is decoded.
#[must_use]
pub fn layout_hash(manifest: &LayoutManifest) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(DOMAIN);

    write_len(&mut hasher, manifest.properties.len());
    for property in &manifest.properties {
        write_str(&mut hasher, &property.name);
        write_kind(&mut hasher, &property.kind);
    }

    write_len(&mut hasher, manifest.rpcs.len());
    for rpc in &manifest.rpcs {
        hasher.update(&rpc.id.to_le_bytes());
        write_str(&mut hasher, &rpc.name);
        write_str(&mut hasher, &rpc.rpc_type);
    }

    let hash = hasher.finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(out)
}

fn write_kind(hasher: &mut Hasher, kind: &ValueKind) {
    match kind {
        ValueKind::Unit => write_u8(hasher, 0),
        ValueKind::Bool => write_u8(hasher, 1),
        ValueKind::UInt { bits } => {
            write_u8(hasher, 2);
            write_u8(hasher, *bits);
        }
        ValueKind::SInt { bits } => {
            write_u8(hasher, 3);
            write_u8(hasher, *bits);
        }
        ValueKind::Float { bits } => {
            write_u8(hasher, 4);
            write_u8(hasher, *bits);
        }
        ValueKind::Str => write_u8(hasher, 5),
        ValueKind::List(item) => {
            write_u8(hasher, 6);
            write_kind(hasher, item);
        }
        ValueKind::Tuple(items) => {
            write_u8(hasher, 7);
            write_len(hasher, items.len());
            for item in items {
                write_kind(hasher, item);
            }
        }
    }
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_len(hasher: &mut Hasher, len: usize) {
    hasher.update(&(len as u64).to_le_bytes());
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_len(hasher, value.len());
    hasher.update(value.as_bytes());
}

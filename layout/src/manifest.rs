//! Layout manifests.

use crate::replicated::ValueKind;

/// Description of a layout's wire shape: properties in wire order followed by
/// the RPC table in id order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutManifest {
    pub properties: Vec<PropertyEntry>,
    pub rpcs: Vec<RpcEntry>,
}

/// One replicated property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyEntry {
    pub name: String,
    pub kind: ValueKind,
}

/// One RPC slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RpcEntry {
    pub id: u16,
    pub name: String,
    /// `"server"` or `"client"`.
    pub rpc_type: String,
}

//! Dynamic payloads for configured event channels.
//!
//! Channels created in Rust can carry any `Clone` type. Channels created
//! from configuration carry a [`Payload`], and declare the [`PayloadKind`]
//! they accept so mismatched raises are caught while the scene is built.

use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::math::Vec3;

/// A value threaded through a configured channel raise.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    /// No payload (untyped channel).
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Entity(EntityId),
    Vector(Vec3),
}

impl Payload {
    /// The kind of this payload.
    #[must_use]
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::None => PayloadKind::None,
            Self::Bool(_) => PayloadKind::Bool,
            Self::Int(_) => PayloadKind::Int,
            Self::Float(_) => PayloadKind::Float,
            Self::Text(_) => PayloadKind::Text,
            Self::Entity(_) => PayloadKind::Entity,
            Self::Vector(_) => PayloadKind::Vector,
        }
    }

    /// Numeric view of the payload, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Entity carried by the payload, if any.
    #[must_use]
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(*id),
            _ => None,
        }
    }
}

/// The declared payload type of a configured channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    #[default]
    None,
    Bool,
    Int,
    Float,
    Text,
    Entity,
    Vector,
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Entity => "entity",
            Self::Vector => "vector",
        };
        f.write_str(name)
    }
}

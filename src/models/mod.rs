//! Data models for armiger.
//!
//! This module contains the core data structures used throughout the system:
//! catalog records on one side, discussion items and the message types
//! derived from them on the other.

mod catalog;
mod discussion;

pub use catalog::{
    AttackProfile, DamageType, MeleeAttacks, RangedAttack, RangedDamage, SpecialAttack,
    SwingTimings, WeaponRecord,
};
pub use discussion::{
    ConversationChain, DiscussionItem, Message, Role, Thread, ThreadNode,
};

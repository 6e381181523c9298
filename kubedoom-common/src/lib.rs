//! Control-socket protocol shared between the kubedoom server and its clients
//!
//! The game talks to the server over a local socket with a two-word grammar:
//! - `list` - answered with one fixed-width record per pod
//! - `kill <id>` - no answer, the pod whose identifier matches is deleted
//!
//! Pods are named to the game by a small integer derived from the qualified
//! `namespace/name` string, so both sides must agree on [`pod_id`].

pub mod command;
pub mod record;

pub use command::{Command, ParseError};
pub use record::{decode_records, encode_record, OverflowPolicy, RecordLayout};

/// Seed of the identifier hash
pub const HASH_SEED: i32 = 5381;

/// Size of the single read a session performs for its command
pub const READ_BUFFER_SIZE: usize = 40960;

/// Compute the identifier the game uses for a qualified pod name.
///
/// `acc = acc * 33 + c` over the scalar values of `name`, with 32-bit
/// wrapping, seeded at [`HASH_SEED`]. A negative result is negated, which
/// leaves `i32::MIN` negative exactly as the game's C implementation does.
pub fn pod_id(name: &str) -> i32 {
    let hash = name.chars().fold(HASH_SEED, |acc, c| {
        (acc << 5).wrapping_add(acc).wrapping_add(c as i32)
    });

    if hash < 0 {
        hash.wrapping_neg()
    } else {
        hash
    }
}

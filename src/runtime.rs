//! Identity-based runtime object model and evaluation state.
//!
//! The evaluation loop itself lives outside this crate; what lives here is
//! everything the native bridge touches: instances keyed by id, per-frame
//! operand stacks, the four sentinel objects, and the typed fault channel.
pub mod error;
pub mod evaluation;
pub mod object;

/// Well-known fully qualified module names, part of the contract between
/// the language standard library and the host.
pub mod fqn {
    pub const NUMBER: &str = "wollok.lang.Number";
    pub const STRING: &str = "wollok.lang.String";
    pub const BOOLEAN: &str = "wollok.lang.Boolean";
    pub const LIST: &str = "wollok.lang.List";
    pub const SET: &str = "wollok.lang.Set";
    pub const OBJECT: &str = "wollok.lang.Object";
    pub const EXCEPTION: &str = "wollok.lang.Exception";
    pub const GAME: &str = "wollok.game.game";
    pub const SOUND: &str = "wollok.game.Sound";
    pub const GAME_MIRROR: &str = "wollok.gameMirror.gameMirror";
    pub const IO: &str = "wollok.io.io";
}

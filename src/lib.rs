//! Tactics board engine: tokens on a 2D field, annotated with strokes, lines,
//! arrows and zone markers.
//!
//! The crate is host-agnostic. It owns the field↔surface transform, the
//! ordered render layers, pointer dispatch, and the per-tool interaction
//! state machines that turn pointer streams into scene mutations. The host
//! (a browser shell compiled to WebAssembly, or the `fieldboard` replay
//! binary) only forwards raw pointer events and provides a render surface.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Points and the segment/circle math shared by hit-testing and erasing |
//! | [`transform`] | 2D affine matrices (`Matrix2D`) |
//! | [`scene`] | Scene snapshot: tokens, drawings, field, orientation |
//! | [`surface`] | Render surface abstraction and a recording implementation |
//! | [`engine`] | Render engine: fit transform, layers, pointer dispatch, redraw coalescing |
//! | [`render`] | Built-in layer renderers and render style |
//! | [`tools`] | Tool registry and per-tool pointer state machines |
//! | [`history`] | Bounded undo/redo with gesture batching |
//! | [`board`] | Host glue wiring engine, tools, and history together |
//! | [`export`] | Export collaborator interface |
//! | [`replay`] | Scripted pointer replay for headless hosts |
//! | [`config`] | Board configuration from JSON and environment |
//! | [`consts`] | Shared numeric constants (radii, thresholds, capacities) |

pub mod board;
pub mod config;
pub mod consts;
pub mod engine;
pub mod export;
pub mod geometry;
pub mod history;
pub mod render;
pub mod replay;
pub mod scene;
pub mod surface;
pub mod tools;
pub mod transform;

#[cfg(target_arch = "wasm32")]
pub mod web;

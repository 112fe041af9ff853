//! # Game Client Library
//!
//! Client-side implementation for the networked top-down arena shooter.
//! The server owns the simulation and periodically broadcasts world
//! snapshots; this library keeps the displayed world responsive and
//! smooth despite latency and irregular arrival, while never drifting
//! from server authority for more than a bounded window.
//!
//! ## Architecture Overview
//!
//! ### Server Authority, Local Smoothing
//! The server's position for every entity is ground truth. The client
//! never simulates game rules; it decides, per entity and per snapshot,
//! how to move what is on screen toward the truth without jarring the
//! player.
//!
//! ### Three-Tier Reconciliation
//! The locally controlled player compares each authoritative position
//! with the displayed one and picks a strategy by displacement: small
//! errors are absorbed by normal target-seeking, medium errors run a
//! short ease-out tween, and large errors (reconnects, lag spikes)
//! teleport, because animating them would be misleading.
//!
//! ### Remote Interpolation and Dead-Reckoning
//! Other players ease toward their last reported position at a fixed
//! convergence rate. Projectiles instead extrapolate linearly from their
//! authoritative velocity, which stays stable between snapshots.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! The transport session: one persistent JSON-over-TCP connection with
//! queued sends, typed subscriptions, and connection transitions, pumped
//! from the frame loop.
//!
//! ### Input Module (`input`)
//! Per-frame key sampling debounced into discrete start/stop/fire
//! commands so steady state sends nothing.
//!
//! ### Game Module (`game`)
//! The entity registry: snapshot diffing, spawn/despawn, and the scene
//! hook seam for collision registration.
//!
//! ### Entities Module (`entities`)
//! Per-entity display state and motion: reconciliation, interpolation,
//! dead-reckoning, invulnerability flashing.
//!
//! ### App Module (`app`)
//! Wires session, registry and input together and owns the registration
//! state machine.
//!
//! ### Rendering Module (`rendering`)
//! Shape-based presentation of the world and HUD.

pub mod app;
pub mod entities;
pub mod game;
pub mod input;
pub mod network;
pub mod rendering;

//! Skeletal pose evaluation for animated meshes.
//!
//! A scene hierarchy with animation channels and per-mesh bone lists goes in,
//! a flat list of bone matrices indexed by bone index comes out, ready to be
//! uploaded as shader uniforms once per frame.
pub mod anim;
pub mod config;
pub mod dualquat;
pub mod rz_error;
pub mod scene_import;
pub mod types;

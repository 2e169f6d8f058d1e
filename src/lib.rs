//! virtwold - virtual Wake-on-LAN for libvirt hosts.
//!
//! Listens on a network interface for Wake-on-LAN magic packets and, when
//! one targets a hardware address configured on a local virtual machine,
//! asks the hypervisor to start, wake or resume that machine.
//!
//! # Architecture
//!
//! ```text
//! PacketCapture -> FrameClassifier -> WakeOrchestrator -> EventReporter
//!                                        |
//!                     InventoryMatcher, WakeDecisionTable, Hypervisor
//! ```
//!
//! - [`capture`]: link-layer capture filtered to WOL frames
//! - [`classifier`]: turns frames into wake candidates
//! - [`inventory`]: domain descriptors and address matching
//! - [`decision`]: power state to wake action
//! - [`hypervisor`]: control plane traits and the `virsh` backend
//! - [`orchestrator`]: the per-frame wake cycle and its policies
//! - [`reporter`]: operator-facing log output

pub mod capture;
pub mod classifier;
pub mod config;
pub mod decision;
pub mod domain;
pub mod error;
pub mod hypervisor;
pub mod inventory;
pub mod orchestrator;
pub mod parser;
pub mod reporter;

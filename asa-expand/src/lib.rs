//! Object-group expansion for ASA and PIX firewall configurations.
//!
//! Access-lists on these platforms may name `object` and `object-group`
//! definitions instead of literal addresses, services and protocols. This
//! library rewrites such a configuration so every access-list only carries
//! concrete values, which makes rule sets diffable and auditable.
//!
//! # Architecture
//!
//! ## Catalog
//!
//! - [`builder`]: Record object and object-group blocks, inline nested
//!   `object` members and annotate NAT commands
//!
//! ## Expansion
//!
//! - [`expand`]: Recursively replace references in one access-list, with
//!   structural rewriting for service objects
//! - [`normalize`]: Run the builder and expander over a whole document
//! - [`settings`]: Tunables loaded from TOML
//!
//! ## Validation and reporting
//!
//! - [`verify`]: Reference check report
//! - [`verify_refs`]: Individual reference findings
//! - [`report`]: Terminal-friendly colored output
//!
//! Line splitting and the access-list and service grammars live in
//! `asa-config-core`.
//!
//! # Examples
//!
//! ```ignore
//! use asa_config_core::parse_file;
//! use asa_expand::normalize::normalize;
//! use asa_expand::settings::Settings;
//!
//! let lines = parse_file("running-config.cfg".as_ref())?;
//! let normalized = normalize(&lines, &Settings::default())?;
//! println!("{}", asa_config_core::write(&normalized.lines));
//! ```

pub mod builder;
pub mod expand;
pub mod normalize;
pub mod report;
pub mod settings;
pub mod verify;
pub mod verify_refs;

// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Confab pipeline seams.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod history;
pub mod responder;
pub mod transcriber;
pub mod transport;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use history::HistoryAdapter;
pub use responder::ResponderAdapter;
pub use transcriber::TranscriberAdapter;
pub use transport::TransportAdapter;

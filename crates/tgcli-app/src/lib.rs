// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod client;
pub mod ids;
pub mod model;
pub mod nav;
pub mod state;

pub use client::*;
pub use ids::*;
pub use model::*;
pub use nav::*;
pub use state::*;

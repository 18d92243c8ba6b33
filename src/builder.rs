#[path = "builder/state.rs"]
mod state;

#[path = "builder/bridge_builder.rs"]
mod bridge_builder;

#[path = "builder/resilience.rs"]
mod resilience;

#[path = "builder/content.rs"]
mod content;

#[path = "builder/build.rs"]
mod build;

pub use bridge_builder::BridgeBuilder;
pub use build::Bridge;

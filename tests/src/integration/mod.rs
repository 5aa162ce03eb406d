//! Cross-component integration scenarios.

#[cfg(test)]
mod fixtures;

mod autoscaling;
mod node;
mod pipeline;

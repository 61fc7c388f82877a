//! Example demonstrating content-type driven listener notifications.
//!
//! This example shows how to:
//! - Declare observers for content-type patterns
//! - Receive connect/disconnect callbacks as buffers come and go
//! - React to buffers changing their content type
//! - Tear everything down by closing the registry
//!
//! Run with: cargo run --example buffer_lifecycle

use content_listeners::prelude::*;
use std::sync::Arc;

/// Prints every callback it receives.
struct Announcer {
    name: &'static str,
}

impl Announcer {
    fn describe(resources: &[Resource]) -> String {
        resources
            .iter()
            .map(Resource::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl ConnectionListener for Announcer {
    fn connected(
        &self,
        context: &ViewContext,
        reason: ConnectionReason,
        resources: &[Resource],
    ) -> Result<(), ListenerError> {
        println!(
            "[{}] connected in {} ({}): {}",
            self.name,
            context.id,
            reason,
            Self::describe(resources)
        );
        Ok(())
    }

    fn disconnected(
        &self,
        context: &ViewContext,
        reason: ConnectionReason,
        resources: &[Resource],
    ) -> Result<(), ListenerError> {
        println!(
            "[{}] disconnected in {} ({}): {}",
            self.name,
            context.id,
            reason,
            Self::describe(resources)
        );
        Ok(())
    }
}

fn main() -> content_listeners::error::Result<()> {
    println!("=== Buffer Lifecycle Example ===\n");

    // Content types: markdown is a kind of text, and so is any code
    let types = Arc::new(ContentTypeRegistry::new().with_bases("code", ["text"]));

    // The view starts with a single markdown buffer
    let graph = Arc::new(MemoryGraph::with_resources([Resource::new(
        1,
        "text/markdown",
    )]));

    let registry = ListenerRegistry::builder()
        .with_context(ViewContext::new(
            7,
            RoleSet::new().with("editable").with("interactive"),
        ))
        .with_graph(graph.clone())
        .with_type_relation(types)
        .with_observer(
            ObserverDescriptor::new("spell-checker", || {
                println!("(activating spell-checker)");
                Ok(Announcer {
                    name: "spell-checker",
                })
            })
            .with_content_type("text"),
        )
        .with_observer(
            ObserverDescriptor::new("rust-analyzer", || {
                println!("(activating rust-analyzer)");
                Ok(Announcer {
                    name: "rust-analyzer",
                })
            })
            .with_content_type("code/rust")
            .with_role("editable"),
        )
        .with_observer(
            ObserverDescriptor::new("image-preview", || Ok(Announcer { name: "image-preview" }))
                .with_content_type("image")
                .with_role("preview"),
        )
        .build()?;

    println!(
        "\nRegistry open with {} applicable observer(s), active: {:?}\n",
        registry.observer_count(),
        registry.active_observers()
    );

    println!("--- Opening a Rust buffer ---");
    let rust = graph.insert("code/rust");

    println!("\n--- Renaming the Rust buffer to a plain text file ---");
    graph.retag(rust.id, "text/plain");

    println!("\n--- Closing the markdown buffer ---");
    graph.remove(&[ResourceId(1)]);

    println!("\n--- Closing the view ---");
    registry.close();

    println!("\n--- Edits after close are not reported ---");
    graph.insert("code/rust");

    println!("\n=== Example Complete ===");
    Ok(())
}

//! # Flow Graph Compiler
//!
//! Main entry points for compiling flow graphs to Go source code.

use crate::codegen::GoEmitter;
use crate::config::EmitterConfig;
use crate::error::Result;
use crate::graph::Graph;
use tokio_util::sync::CancellationToken;

/// Compile a flow graph to Go source code
///
/// This is the main entry point for the compiler. It renders the graph as a
/// single wrapper function using the default emitter settings.
///
/// # Arguments
///
/// * `graph` - The flow graph to compile
///
/// # Returns
///
/// * `Ok(String)` - The generated Go source code
/// * `Err(GraphError)` - A descriptive error if compilation fails
///
/// # Examples
///
/// ```rust,no_run
/// use fgc::{compile_graph, Graph, GraphConfig};
///
/// let graph = Graph::new(GraphConfig::new("Sync", "Sync", "Synchronizes things"))?;
/// match compile_graph(&graph) {
///     Ok(code) => println!("Generated:\n{}", code),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// # Ok::<(), fgc::GraphError>(())
/// ```
pub fn compile_graph(graph: &Graph) -> Result<String> {
    compile_graph_with_config(graph, EmitterConfig::default(), &CancellationToken::new())
}

/// Compile a flow graph with explicit emitter settings and cancellation
///
/// The render aborts with [`GraphError::Cancelled`](crate::GraphError::Cancelled)
/// if `cancel` fires before every component has been emitted.
///
/// # Arguments
///
/// * `graph` - The flow graph to compile
/// * `config` - Spelling of headers, error binding and discard placeholder
/// * `cancel` - Token polled between component emissions
pub fn compile_graph_with_config(
    graph: &Graph,
    config: EmitterConfig,
    cancel: &CancellationToken,
) -> Result<String> {
    tracing::info!("[FGC] Starting flow graph compilation");
    tracing::info!(
        "[FGC] Graph: {} ({} components, {} connections)",
        graph.name(),
        graph.component_count(),
        graph.connection_count()
    );

    // Phase 1: Consistency
    tracing::info!("[FGC] Phase 1: Checking graph consistency...");
    graph.check_consistency()?;

    // Phase 2: Rendering
    tracing::info!("[FGC] Phase 2: Rendering wrapper function...");
    let mut emitter = GoEmitter::with_config(config);
    let code = graph.render(&mut emitter, cancel)?;

    tracing::info!("[FGC] Code generation complete ({} bytes)", code.len());
    tracing::info!("[FGC] Compilation successful!");

    Ok(code)
}

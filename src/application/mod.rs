// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no layer wiring (Layer 5), no
// printing (Layer 1), no file formats (Layer 6).
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Request → concrete graph, shared by the other use cases
pub mod build_use_case;

// Layer table and optional probe forward pass
pub mod summary_use_case;

// Freshly initialised graph → artifact directory
pub mod export_use_case;

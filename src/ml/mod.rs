// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Every Burn module and tensor operation lives in this layer.
//
//   layout.rs       - FeatureLayout: the shared task / timestep /
//                     feature-width constants
//   io.rs           - named input and output tensor containers
//   blocks.rs       - shared encoder, group fusion stack, heads
//   graph.rs        - CohesionModel trait (name, signature,
//                     layer table, named forward)
//
//   filstm.rs       - FI-LSTM: one pre-concatenated stream
//   fitg.rs         - fItG: shared individual encoder + fusion
//   fitg_emotion.rs - fItG plus per-task emotion heads
//   tbd.rs          - TBD: pretrained fItG trunk + new heads
//
//   builders.rs     - create_* entry points with default widths
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Records and Checkpointing)

use burn::backend::{Autodiff, NdArray};

/// CPU backend used to build and inspect graphs
pub type DefaultBackend = NdArray;

/// Backend with gradient tracking, for fine-tuning
pub type TrainingBackend = Autodiff<DefaultBackend>;

pub mod layout;
pub mod io;
pub mod blocks;
pub mod graph;

pub mod filstm;
pub mod fitg;
pub mod fitg_emotion;
pub mod tbd;

pub mod builders;

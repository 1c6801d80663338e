// ============================================================
// Layer 5 — Builders
// ============================================================
// One entry point per architecture. Each returns the freshly
// initialised graph together with the config that produced it,
// so the pair can be saved as an artifact and rebuilt later.

use std::path::Path;

use burn::prelude::*;

use crate::domain::error::ArchError;
use crate::ml::{
    filstm::{FilstmConfig, FilstmModel},
    fitg::{FitgConfig, FitgModel},
    fitg_emotion::{FitgEmotionConfig, FitgEmotionModel},
    tbd::{TbdConfig, TbdModel},
};

/// A graph and the config it was built from.
#[derive(Debug)]
pub struct Built<C, M> {
    pub config: C,
    pub model:  M,
}

impl<C, M> Built<C, M> {
    pub fn into_parts(self) -> (C, M) {
        (self.config, self.model)
    }
}

pub fn create_filstm<B: Backend>(device: &B::Device) -> Built<FilstmConfig, FilstmModel<B>> {
    let config = FilstmConfig::new();
    let model  = config.init(device);
    Built { config, model }
}

pub fn create_fitg<B: Backend>(device: &B::Device) -> Built<FitgConfig, FitgModel<B>> {
    let config = FitgConfig::new();
    let model  = config.init(device);
    Built { config, model }
}

/// `strategy` must be "Bottom-up" or "Top-down"; nothing is built otherwise.
pub fn create_fitg_emotion<B: Backend>(
    strategy: &str,
    device:   &B::Device,
) -> Result<Built<FitgEmotionConfig, FitgEmotionModel<B>>, ArchError> {
    let config = FitgEmotionConfig::from_strategy(strategy)?;
    let model  = config.init(device);
    Ok(Built { config, model })
}

/// Build TBD on the fItG artifact stored in `pretrained`, dropping its
/// last `trunk_offset` layers.
pub fn create_tbd<B: Backend>(
    pretrained:   impl AsRef<Path>,
    trunk_offset: usize,
    device:       &B::Device,
) -> Result<Built<TbdConfig, TbdModel<B>>, ArchError> {
    let config = TbdConfig::new().with_trunk_offset(trunk_offset);
    let model  = config.init_from_pretrained(pretrained, device)?;
    Ok(Built { config, model })
}

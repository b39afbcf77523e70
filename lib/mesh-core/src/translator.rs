//! Seam to the mesh-specific translator

use crate::{Reporter, Snapshot};

/// Turns a snapshot into mesh-native configuration.
///
/// The approval engine calls this in dry-run mode: the output is discarded
/// and only the reports made through `reporter` are kept. The reporter is
/// borrowed for the call and cannot be retained.
pub trait Translator {
    type Output;

    fn translate(
        &self,
        snapshot: &Snapshot,
        reporter: &mut dyn Reporter,
    ) -> anyhow::Result<Self::Output>;
}

/// Translator that produces nothing and reports nothing.
/// Used when no mesh translator is linked in.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTranslator;

impl Translator for NoopTranslator {
    type Output = ();

    fn translate(&self, _snapshot: &Snapshot, _reporter: &mut dyn Reporter) -> anyhow::Result<()> {
        Ok(())
    }
}

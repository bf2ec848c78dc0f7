use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{EpisodeId, Error, Result};

/// Anything that carries an episode identity and its fingerprint points.
pub trait Fingerprinted {
    fn episode_id(&self) -> &EpisodeId;

    /// Fingerprint points, one per [SAMPLES_TO_SECONDS](super::SAMPLES_TO_SECONDS) of audio
    /// from the start of the fingerprinted region. Empty if fingerprinting failed.
    fn points(&self) -> &[u32];
}

impl<T: Fingerprinted + ?Sized> Fingerprinted for &T {
    fn episode_id(&self) -> &EpisodeId {
        (**self).episode_id()
    }

    fn points(&self) -> &[u32] {
        (**self).points()
    }
}

/// Fingerprint data for a single episode, as produced by an external fingerprinting tool.
///
/// On disk, fingerprints are stored either as JSON (`.json` extension) or bincode (any other
/// extension).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Fingerprint {
    pub episode_id: EpisodeId,
    pub points: Vec<u32>,
}

impl Fingerprint {
    pub fn new(episode_id: impl Into<EpisodeId>, points: impl Into<Vec<u32>>) -> Self {
        Self {
            episode_id: episode_id.into(),
            points: points.into(),
        }
    }

    /// Load fingerprint data from a path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FingerprintDataNotFound(path.to_owned()));
        }
        let f = std::io::BufReader::new(std::fs::File::open(path)?);
        if is_json(path) {
            Ok(serde_json::from_reader(f)?)
        } else {
            Ok(bincode::deserialize_from(f)?)
        }
    }

    /// Write fingerprint data to a path, using the same format rules as [Fingerprint::from_path].
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut f = std::io::BufWriter::new(std::fs::File::create(path)?);
        if is_json(path) {
            serde_json::to_writer(&mut f, self)?;
        } else {
            bincode::serialize_into(&mut f, self)?;
        }
        Ok(())
    }
}

impl Fingerprinted for Fingerprint {
    fn episode_id(&self) -> &EpisodeId {
        &self.episode_id
    }

    fn points(&self) -> &[u32] {
        &self.points
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

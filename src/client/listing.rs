//! Listing command selection.

use crate::protocol::{Command, Feature, FeatureSet};

/// Which command produces a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    List,
    Mlsd,
    Mlst,
}

impl ListKind {
    /// Prefers MLSD, then MLST, then plain LIST.
    pub fn for_features(features: FeatureSet) -> Self {
        if features.contains(Feature::Mlsd) {
            ListKind::Mlsd
        } else if features.contains(Feature::Mlst) {
            ListKind::Mlst
        } else {
            ListKind::List
        }
    }

    pub fn command(self, path: &str) -> Command {
        let path = path.to_string();
        match self {
            ListKind::List => Command::List(path),
            ListKind::Mlsd => Command::Mlsd(path),
            ListKind::Mlst => Command::Mlst(path),
        }
    }

    /// MLST answers on the control channel; the others need a data channel.
    pub fn uses_data_channel(self) -> bool {
        !matches!(self, ListKind::Mlst)
    }
}

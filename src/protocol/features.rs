//! Server extension detection from `FEAT` replies.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Optional extensions the client recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Mlsd,
    Mlst,
    Pret,
    Size,
    Mdtm,
    Utf8,
    Epsv,
    Tvfs,
    Rest,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::Mlsd,
        Feature::Mlst,
        Feature::Pret,
        Feature::Size,
        Feature::Mdtm,
        Feature::Utf8,
        Feature::Epsv,
        Feature::Tvfs,
        Feature::Rest,
    ];

    /// Token as advertised by servers.
    pub fn token(self) -> &'static str {
        match self {
            Feature::Mlsd => "MLSD",
            Feature::Mlst => "MLST",
            Feature::Pret => "PRET",
            Feature::Size => "SIZE",
            Feature::Mdtm => "MDTM",
            Feature::Utf8 => "UTF8",
            Feature::Epsv => "EPSV",
            Feature::Tvfs => "TVFS",
            Feature::Rest => "REST",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Set of detected features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureSet(u16);

impl FeatureSet {
    /// No optional features: what callers assume when FEAT failed.
    pub const EMPTY: FeatureSet = FeatureSet(0);

    /// Scans FEAT reply lines case-insensitively; a token anywhere in a line
    /// adds that feature.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = FeatureSet::EMPTY;
        for line in lines {
            let upper = line.as_ref().to_ascii_uppercase();
            for feature in Feature::ALL {
                if upper.contains(feature.token()) {
                    set.insert(feature);
                }
            }
        }
        set
    }

    pub fn contains(self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    pub fn insert(&mut self, feature: Feature) {
        self.0 |= feature.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl BitOr for FeatureSet {
    type Output = FeatureSet;

    fn bitor(self, rhs: FeatureSet) -> FeatureSet {
        FeatureSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for FeatureSet {
    fn bitor_assign(&mut self, rhs: FeatureSet) {
        self.0 |= rhs.0;
    }
}

impl From<Feature> for FeatureSet {
    fn from(feature: Feature) -> Self {
        FeatureSet(feature.bit())
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self.iter().map(Feature::token).collect();
        if tokens.is_empty() {
            f.write_str("<none>")
        } else {
            f.write_str(&tokens.join(","))
        }
    }
}

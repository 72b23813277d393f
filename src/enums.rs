use tracing::warn;

/// The three canonical acquisition planes. The natively acquired stack is
/// always treated as axial; the other two are derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Axial,
        Orientation::Coronal,
        Orientation::Sagittal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Orientation::Axial => "axial",
            Orientation::Coronal => "coronal",
            Orientation::Sagittal => "sagittal",
        }
    }
}

/// Storage type of a slice's pixel samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelRepresentation {
    #[default]
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Uint32,
    Sint32,
}

impl PixelRepresentation {
    /// Parse a representation label as reported by the decoding collaborator.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Uint8" => Some(Self::Uint8),
            "Sint8" => Some(Self::Sint8),
            "Uint16" => Some(Self::Uint16),
            "Sint16" => Some(Self::Sint16),
            "Uint32" => Some(Self::Uint32),
            "Sint32" => Some(Self::Sint32),
            _ => None,
        }
    }

    /// Like [`from_label`](Self::from_label), but unrecognized labels degrade
    /// to `Uint8` storage. Lossy for anything wider than 8 bits.
    pub fn parse_lossy(label: &str) -> Self {
        Self::from_label(label).unwrap_or_else(|| {
            warn!(label, "unrecognized pixel representation, storing as Uint8");
            Self::Uint8
        })
    }
}

/// Sort strategies tried in order when ingesting a raw slice set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortMethod {
    InstanceNumber,
    ContentTime,
    ImagePosition,
}

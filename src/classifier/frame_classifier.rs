//! Frame classification logic.

use std::fmt;
use std::str::FromStr;

use crate::domain::{Frame, MagicPacketFormat, WolCandidate};
use crate::error::ConfigError;
use crate::parser::MagicPacketParser;

/// How much a frame must prove before it counts as a wake request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Trust the capture filter: every delivered frame is a candidate and
    /// the link-layer destination is the target.
    #[default]
    Filter,
    /// Require a well-formed magic packet in the payload and wake the
    /// address it carries.
    Strict,
}

impl FromStr for ValidationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filter" => Ok(Self::Filter),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::InvalidValue {
                key: "validation".to_string(),
                value: s.to_string(),
                expected: "filter or strict",
            }),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter => write!(f, "filter"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// Classifies captured frames as wake requests.
///
/// Pure: no side effects beyond debug logging.
#[derive(Debug, Default, Clone)]
pub struct FrameClassifier {
    mode: ValidationMode,
    parser: MagicPacketParser,
}

impl FrameClassifier {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            parser: MagicPacketParser::new(),
        }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Classify a frame.
    ///
    /// In filter mode this always succeeds. In strict mode frames without
    /// a valid magic packet are rejected.
    pub fn classify(&self, frame: &Frame) -> Option<WolCandidate> {
        let format = MagicPacketFormat::from_frame_length(frame.length);

        let target = match self.mode {
            ValidationMode::Filter => frame.destination,
            ValidationMode::Strict => match self.parser.parse(&frame.payload) {
                Some(packet) => packet.target,
                None => {
                    tracing::debug!(
                        "Dropping {} frame from {}: no valid magic packet",
                        frame.protocol,
                        frame.source
                    );
                    return None;
                }
            },
        };

        Some(WolCandidate {
            target,
            protocol: frame.protocol,
            format,
        })
    }
}

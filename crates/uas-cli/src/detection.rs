//! Target detection interface.

use uas_core::Coordinate;

/// Source of airdrop targets found during the detect pass.
pub trait TargetDetector {
    fn detect_targets(&mut self) -> Vec<Coordinate>;
}

/// Reports a fixed list of targets, for runs without a camera.
#[derive(Debug, Clone, Default)]
pub struct PredeterminedTargets {
    targets: Vec<Coordinate>,
}

impl PredeterminedTargets {
    pub fn new(targets: Vec<Coordinate>) -> Self {
        Self { targets }
    }
}

impl TargetDetector for PredeterminedTargets {
    fn detect_targets(&mut self) -> Vec<Coordinate> {
        self.targets.clone()
    }
}

/// Parse `lat,lon` or `lat,lon,alt` in decimal degrees.
pub fn parse_target(s: &str) -> Result<Coordinate, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid target '{}': {}", s, e))?;

    match parts.as_slice() {
        [lat, lon] => Ok(Coordinate::new(*lat, *lon, 0.0)),
        [lat, lon, alt] => Ok(Coordinate::new(*lat, *lon, *alt)),
        _ => Err(format!("invalid target '{}': expected lat,lon[,alt]", s)),
    }
}

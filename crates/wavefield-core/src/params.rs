//! Parameter identifiers for every channel scope.
//!
//! Units: meters, seconds, degrees, decibels, percent. Booleans are 0/1 and
//! enumerations are stored as their index.

use crate::ParameterRange;

const POS: f32 = 100.0;
const HEIGHT: f32 = 50.0;

param_set! {
    /// System-wide geometry and rendering settings.
    pub enum GlobalParam {
        /// m/s
        SpeedOfSound => ParameterRange::linear(300.0, 400.0, 343.0),
        /// Distance below which no distance attenuation applies.
        ReferenceDistance => ParameterRange::linear(0.1, 10.0, 1.0),
        /// dB of high-frequency loss per meter.
        AirAbsorption => ParameterRange::linear(0.0, 1.0, 0.02),

        /// 0 = box, 1 = cylinder, 2 = dome.
        StageShape => ParameterRange::integer(0, 2, 0),
        StageWidth => ParameterRange::linear(1.0, 200.0, 20.0),
        StageDepth => ParameterRange::linear(1.0, 200.0, 10.0),
        StageHeight => ParameterRange::linear(1.0, 100.0, 8.0),
        StageDiameter => ParameterRange::linear(1.0, 200.0, 20.0),
        StageCenterX => ParameterRange::linear(-POS, POS, 0.0),
        StageCenterY => ParameterRange::linear(-POS, POS, 0.0),
        StageCenterZ => ParameterRange::linear(-HEIGHT, HEIGHT, 0.0),

        SidelinesActive => ParameterRange::toggle(false),
        /// Width of the fade zone inside the stage edge.
        SidelinesFringe => ParameterRange::linear(0.1, 20.0, 1.0),

        FloorHeight => ParameterRange::linear(-HEIGHT, HEIGHT, 0.0),
        FloorAttenuation => ParameterRange::linear(-60.0, 0.0, -6.0),
        FloorHfDamping => ParameterRange::linear(-24.0, 0.0, -3.0),

        BinauralDistance => ParameterRange::linear(0.0, POS, 10.0),
        /// Azimuth of the monitoring listener around the stage center.
        BinauralAngle => ParameterRange::angle(-90.0),
        BinauralSpacing => ParameterRange::linear(0.05, 4.0, 0.3),
        BinauralTrim => ParameterRange::linear(-60.0, 12.0, 0.0),
        BinauralDelay => ParameterRange::linear(0.0, 500.0, 0.0),
        BinauralAngleOn => ParameterRange::linear(0.0, 180.0, 120.0),
        BinauralAngleOff => ParameterRange::linear(0.0, 180.0, 180.0),
    }
}

param_set! {
    /// Per-input (virtual source) parameters.
    pub enum InputParam {
        PositionX => ParameterRange::linear(-POS, POS, 0.0),
        PositionY => ParameterRange::linear(-POS, POS, 0.0),
        PositionZ => ParameterRange::linear(-HEIGHT, HEIGHT, 0.0),
        OffsetX => ParameterRange::linear(-POS, POS, 0.0),
        OffsetY => ParameterRange::linear(-POS, POS, 0.0),
        OffsetZ => ParameterRange::linear(-HEIGHT, HEIGHT, 0.0),
        FlipX => ParameterRange::toggle(false),
        FlipY => ParameterRange::toggle(false),
        FlipZ => ParameterRange::toggle(false),

        /// dB trim.
        Attenuation => ParameterRange::linear(-92.0, 12.0, 0.0),
        /// ms added to every routing of this input.
        DelayTrim => ParameterRange::linear(-100.0, 100.0, 0.0),
        /// Off = acoustic precedence, on = minimal latency.
        MinimalLatency => ParameterRange::toggle(false),
        /// 0 = logarithmic, 1 = inverse power.
        AttenuationLaw => ParameterRange::integer(0, 1, 0),
        /// dB per decade for the logarithmic law.
        DistanceAttenuation => ParameterRange::linear(0.0, 60.0, 20.0),
        /// Exponent for the inverse-power law.
        DistanceRatio => ParameterRange::linear(0.0, 4.0, 1.0),
        /// % of the attenuation common to all outputs that is kept.
        CommonAttenuation => ParameterRange::linear(0.0, 100.0, 100.0),

        /// Full width of the source radiation cone.
        Directivity => ParameterRange::linear(2.0, 360.0, 360.0),
        Rotation => ParameterRange::angle(0.0),
        Tilt => ParameterRange::linear(-90.0, 90.0, 0.0),
        /// HF loss toward outputs behind the source.
        HfShelf => ParameterRange::linear(-24.0, 0.0, -6.0),

        ReverbSend => ParameterRange::linear(-92.0, 12.0, 0.0),
        FloorReflections => ParameterRange::toggle(true),

        SpeedLimitActive => ParameterRange::toggle(false),
        /// m/s
        MaxSpeed => ParameterRange::linear(0.01, 20.0, 1.0),
        TrackingActive => ParameterRange::toggle(false),

        LfoActive => ParameterRange::toggle(false),
        /// Seconds per cycle.
        LfoPeriod => ParameterRange::linear(0.01, 100.0, 5.0),
        LfoPhase => ParameterRange::linear(0.0, 360.0, 0.0),
        LfoShapeX => ParameterRange::integer(0, 8, 0),
        LfoShapeY => ParameterRange::integer(0, 8, 0),
        LfoShapeZ => ParameterRange::integer(0, 8, 0),
        LfoRateX => ParameterRange::linear(0.01, 100.0, 1.0),
        LfoRateY => ParameterRange::linear(0.01, 100.0, 1.0),
        LfoRateZ => ParameterRange::linear(0.01, 100.0, 1.0),
        LfoAmplitudeX => ParameterRange::linear(0.0, 50.0, 1.0),
        LfoAmplitudeY => ParameterRange::linear(0.0, 50.0, 1.0),
        LfoAmplitudeZ => ParameterRange::linear(0.0, 50.0, 1.0),
        LfoPhaseX => ParameterRange::linear(0.0, 360.0, 0.0),
        LfoPhaseY => ParameterRange::linear(0.0, 360.0, 0.0),
        LfoPhaseZ => ParameterRange::linear(0.0, 360.0, 0.0),
        /// -1 clockwise, 0 off, 1 counter-clockwise.
        LfoGyrophone => ParameterRange::integer(-1, 1, 0),

        /// Cartesian x, or radius in polar modes.
        MotionDestinationX => ParameterRange::linear(-3600.0, 3600.0, 0.0),
        /// Cartesian y, or azimuth in polar modes.
        MotionDestinationY => ParameterRange::linear(-3600.0, 3600.0, 0.0),
        /// Cartesian z, height (cylindrical) or elevation (spherical).
        MotionDestinationZ => ParameterRange::linear(-3600.0, 3600.0, 0.0),
        MotionDuration => ParameterRange::linear(0.1, 3600.0, 5.0),
        /// % blend from linear to bell-shaped speed.
        MotionSpeedProfile => ParameterRange::linear(0.0, 100.0, 0.0),
        MotionCurve => ParameterRange::linear(-100.0, 100.0, 0.0),
        MotionAbsolute => ParameterRange::toggle(true),
        MotionReturn => ParameterRange::toggle(false),
        /// 0 = cartesian, 1 = cylindrical, 2 = spherical.
        MotionCoordinateMode => ParameterRange::integer(0, 2, 0),
        MotionTrigger => ParameterRange::toggle(false),
        MotionTriggerThreshold => ParameterRange::linear(-92.0, 0.0, -20.0),
        MotionTriggerReset => ParameterRange::linear(-92.0, 0.0, -60.0),

        TamerActive => ParameterRange::toggle(false),
        TamerRadius => ParameterRange::linear(0.1, 50.0, 3.0),
        /// 0 = linear, 1 = log, 2 = square, 3 = sine.
        TamerShape => ParameterRange::integer(0, 3, 0),
        TamerAttenuation => ParameterRange::linear(-60.0, 0.0, -12.0),
    }
}

param_set! {
    /// Per-output (loudspeaker) parameters.
    pub enum OutputParam {
        PositionX => ParameterRange::linear(-POS, POS, 0.0),
        PositionY => ParameterRange::linear(-POS, POS, 0.0),
        PositionZ => ParameterRange::linear(-HEIGHT, HEIGHT, 0.0),
        /// Listener this speaker serves (minimal latency reference).
        ListenerX => ParameterRange::linear(-POS, POS, 0.0),
        ListenerY => ParameterRange::linear(-POS, POS, -10.0),
        ListenerZ => ParameterRange::linear(-HEIGHT, HEIGHT, 0.0),
        /// 0° faces the audience (-y).
        Orientation => ParameterRange::angle(0.0),
        Pitch => ParameterRange::linear(-90.0, 90.0, 0.0),
        AngleOn => ParameterRange::linear(0.0, 180.0, 90.0),
        AngleOff => ParameterRange::linear(0.0, 180.0, 150.0),
        Attenuation => ParameterRange::linear(-92.0, 12.0, 0.0),
        HfDamping => ParameterRange::linear(-24.0, 0.0, 0.0),
        TamerBypass => ParameterRange::toggle(false),
        FloorReflections => ParameterRange::toggle(true),
    }
}

param_set! {
    /// Per-reverb channel parameters (feed and return).
    pub enum ReverbParam {
        PositionX => ParameterRange::linear(-POS, POS, 0.0),
        PositionY => ParameterRange::linear(-POS, POS, 0.0),
        PositionZ => ParameterRange::linear(-HEIGHT, HEIGHT, 0.0),
        ReturnOffsetX => ParameterRange::linear(-POS, POS, 0.0),
        ReturnOffsetY => ParameterRange::linear(-POS, POS, 0.0),
        ReturnOffsetZ => ParameterRange::linear(-HEIGHT, HEIGHT, 0.0),
        Orientation => ParameterRange::angle(180.0),
        Pitch => ParameterRange::linear(-90.0, 90.0, 0.0),
        AngleOn => ParameterRange::linear(0.0, 180.0, 90.0),
        AngleOff => ParameterRange::linear(0.0, 180.0, 180.0),
        Attenuation => ParameterRange::linear(-92.0, 12.0, 0.0),
        HfDamping => ParameterRange::linear(-24.0, 0.0, 0.0),
        ReturnAttenuation => ParameterRange::linear(-92.0, 12.0, 0.0),
        /// ms
        ReturnDelay => ParameterRange::linear(0.0, 1000.0, 0.0),
    }
}

impl InputParam {
    pub const POSITION: [InputParam; 3] = [Self::PositionX, Self::PositionY, Self::PositionZ];
    pub const OFFSET: [InputParam; 3] = [Self::OffsetX, Self::OffsetY, Self::OffsetZ];
    pub const FLIP: [InputParam; 3] = [Self::FlipX, Self::FlipY, Self::FlipZ];
    pub const LFO_SHAPE: [InputParam; 3] = [Self::LfoShapeX, Self::LfoShapeY, Self::LfoShapeZ];
    pub const LFO_RATE: [InputParam; 3] = [Self::LfoRateX, Self::LfoRateY, Self::LfoRateZ];
    pub const LFO_AMPLITUDE: [InputParam; 3] = [
        Self::LfoAmplitudeX,
        Self::LfoAmplitudeY,
        Self::LfoAmplitudeZ,
    ];
    pub const LFO_PHASE: [InputParam; 3] = [Self::LfoPhaseX, Self::LfoPhaseY, Self::LfoPhaseZ];
    pub const MOTION_DESTINATION: [InputParam; 3] = [
        Self::MotionDestinationX,
        Self::MotionDestinationY,
        Self::MotionDestinationZ,
    ];

    /// Whether a change invalidates this input's routings.
    ///
    /// Modulation settings only matter through the positions the engines
    /// push each tick, so they are excluded.
    pub fn affects_routing(self) -> bool {
        use InputParam::*;
        matches!(
            self,
            PositionX
                | PositionY
                | PositionZ
                | OffsetX
                | OffsetY
                | OffsetZ
                | FlipX
                | FlipY
                | FlipZ
                | Attenuation
                | DelayTrim
                | MinimalLatency
                | AttenuationLaw
                | DistanceAttenuation
                | DistanceRatio
                | CommonAttenuation
                | Directivity
                | Rotation
                | Tilt
                | HfShelf
                | ReverbSend
                | FloorReflections
        )
    }
}

impl OutputParam {
    pub const POSITION: [OutputParam; 3] = [Self::PositionX, Self::PositionY, Self::PositionZ];
    pub const LISTENER: [OutputParam; 3] = [Self::ListenerX, Self::ListenerY, Self::ListenerZ];
}

impl ReverbParam {
    pub const POSITION: [ReverbParam; 3] = [Self::PositionX, Self::PositionY, Self::PositionZ];
    pub const RETURN_OFFSET: [ReverbParam; 3] = [
        Self::ReturnOffsetX,
        Self::ReturnOffsetY,
        Self::ReturnOffsetZ,
    ];
}

impl GlobalParam {
    pub fn is_binaural(self) -> bool {
        use GlobalParam::*;
        matches!(
            self,
            BinauralDistance
                | BinauralAngle
                | BinauralSpacing
                | BinauralTrim
                | BinauralDelay
                | BinauralAngleOn
                | BinauralAngleOff
        )
    }
}

/// Fully scoped parameter identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Global(GlobalParam),
    Input(usize, InputParam),
    Output(usize, OutputParam),
    Reverb(usize, ReverbParam),
}

impl ParamKey {
    pub fn range(self) -> ParameterRange {
        match self {
            ParamKey::Global(p) => p.range(),
            ParamKey::Input(_, p) => p.range(),
            ParamKey::Output(_, p) => p.range(),
            ParamKey::Reverb(_, p) => p.range(),
        }
    }

    /// Channel index for scoped keys.
    pub fn channel(self) -> Option<usize> {
        match self {
            ParamKey::Global(_) => None,
            ParamKey::Input(i, _) | ParamKey::Output(i, _) | ParamKey::Reverb(i, _) => Some(i),
        }
    }
}

impl From<GlobalParam> for ParamKey {
    fn from(param: GlobalParam) -> Self {
        ParamKey::Global(param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_lie_in_range() {
        let keys = GlobalParam::ALL
            .iter()
            .map(|p| p.range())
            .chain(InputParam::ALL.iter().map(|p| p.range()))
            .chain(OutputParam::ALL.iter().map(|p| p.range()))
            .chain(ReverbParam::ALL.iter().map(|p| p.range()));
        for range in keys {
            assert!(range.contains(range.default));
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(InputParam::LfoShapeX.name(), "LfoShapeX");
        assert_eq!(GlobalParam::SpeedOfSound.range().default, 343.0);
    }

    #[test]
    fn test_routing_classification() {
        assert!(InputParam::PositionX.affects_routing());
        assert!(InputParam::MinimalLatency.affects_routing());
        assert!(!InputParam::LfoPeriod.affects_routing());
        assert!(!InputParam::MotionDuration.affects_routing());
        assert!(GlobalParam::BinauralSpacing.is_binaural());
        assert!(!GlobalParam::SpeedOfSound.is_binaural());
    }

    #[test]
    fn test_key_channel() {
        assert_eq!(ParamKey::Input(3, InputParam::PositionX).channel(), Some(3));
        assert_eq!(ParamKey::from(GlobalParam::FloorHeight).channel(), None);
    }
}

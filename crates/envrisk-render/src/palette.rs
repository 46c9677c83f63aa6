//! Color ramps and fill selection

use envrisk_core::models::{ColorRamp, Rgb, Symbology};

/// ColorBrewer "Reds", light to dark
const REDS: [Rgb; 9] = [
    [0xff, 0xf5, 0xf0],
    [0xfe, 0xe0, 0xd2],
    [0xfc, 0xbb, 0xa1],
    [0xfc, 0x92, 0x72],
    [0xfb, 0x6a, 0x4a],
    [0xef, 0x3b, 0x2c],
    [0xcb, 0x18, 0x1d],
    [0xa5, 0x0f, 0x15],
    [0x67, 0x00, 0x0d],
];

/// Ramp position used when every value in a scene is equal
pub const FLAT_POSITION: f64 = 0.5;

/// Sample a ramp at `t` in [0, 1]; out-of-range values are clamped.
pub fn sample(ramp: ColorRamp, t: f64) -> Rgb {
    let anchors: &[Rgb] = match ramp {
        ColorRamp::Reds => &REDS,
    };

    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (anchors.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(anchors.len() - 2);
    let frac = scaled - lower as f64;

    let (a, b) = (anchors[lower], anchors[lower + 1]);
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;
    }
    out
}

/// Linear min/max normalization over the values of one scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub min: f64,
    pub max: f64,
}

impl Normalization {
    /// `None` when there are no finite values
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
            None => Some(Self { min: v, max: v }),
            Some(n) => Some(Self { min: n.min.min(v), max: n.max.max(v) }),
        })
    }

    pub fn is_flat(&self) -> bool {
        self.max - self.min <= f64::EPSILON * self.max.abs().max(1.0)
    }

    pub fn position(&self, value: f64) -> f64 {
        if self.is_flat() {
            return FLAT_POSITION;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Fill color for one shape under a symbology.
///
/// Graduated layers use `intensity` through `normalization`; categorical
/// layers look up `code` and fall back to the table's fallback color.
pub fn fill_color(
    symbology: &Symbology,
    normalization: Option<Normalization>,
    intensity: f64,
    code: Option<i64>,
) -> Rgb {
    match symbology {
        Symbology::Graduated { ramp, .. } => {
            let t = normalization.map(|n| n.position(intensity)).unwrap_or(FLAT_POSITION);
            sample(*ramp, t)
        }
        Symbology::Categorical { fallback, .. } => code
            .and_then(|code| symbology.class(code))
            .map(|class| class.color)
            .unwrap_or(*fallback),
    }
}

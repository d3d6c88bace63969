use crate::foundation::error::TesseraError;
use std::{fmt, str::FromStr};

/// Per-layer color combine function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Dissolve,
    Multiply,
    Screen,
    Overlay,
    Difference,
    Addition,
    Subtract,
    DarkenOnly,
    LightenOnly,
    Hue,
    Saturation,
    Color,
    Value,
    Divide,
}

impl BlendMode {
    pub const ALL: [Self; 15] = [
        Self::Normal,
        Self::Dissolve,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Difference,
        Self::Addition,
        Self::Subtract,
        Self::DarkenOnly,
        Self::LightenOnly,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Value,
        Self::Divide,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Dissolve => "dissolve",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Difference => "difference",
            Self::Addition => "addition",
            Self::Subtract => "subtract",
            Self::DarkenOnly => "darken_only",
            Self::LightenOnly => "lighten_only",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Value => "value",
            Self::Divide => "divide",
        }
    }

    /// Whether compositing in this mode may change an already covered destination's alpha.
    pub fn affects_alpha(self) -> bool {
        matches!(self, Self::Normal | Self::Dissolve)
    }

    /// Combine the first `n` color bytes of `dst` with `src` (before alpha-over).
    pub(crate) fn blend(self, dst: &[u8], src: [u8; 3], n: usize) -> [u8; 3] {
        let mut out = src;
        let rgb = n >= 3;
        match self {
            Self::Normal | Self::Dissolve => {}
            Self::Hue | Self::Saturation | Self::Value if rgb => {
                out = hsv_only(self, [dst[0], dst[1], dst[2]], src);
            }
            Self::Color if rgb => {
                out = color_only([dst[0], dst[1], dst[2]], src);
            }
            // HSV/HLS modes have no meaning on gray.
            Self::Hue | Self::Saturation | Self::Value | Self::Color => {}
            _ => {
                for (c, o) in out.iter_mut().enumerate().take(n) {
                    *o = self.blend_channel(dst[c], src[c]);
                }
            }
        }
        out
    }

    fn blend_channel(self, a: u8, b: u8) -> u8 {
        let (ai, bi) = (u32::from(a), u32::from(b));
        match self {
            Self::Multiply => int_mult(ai, bi),
            Self::Screen => 255 - int_mult(255 - ai, 255 - bi),
            Self::Overlay => {
                let screen = u32::from(255 - int_mult(255 - ai, 255 - bi));
                let mult = u32::from(int_mult(ai, bi));
                int_blend(screen, mult, ai)
            }
            Self::Difference => a.abs_diff(b),
            Self::Addition => a.saturating_add(b),
            Self::Subtract => a.saturating_sub(b),
            Self::DarkenOnly => a.min(b),
            Self::LightenOnly => a.max(b),
            Self::Divide => ((ai * 256) / (1 + bi)).min(255) as u8,
            Self::Normal
            | Self::Dissolve
            | Self::Hue
            | Self::Saturation
            | Self::Color
            | Self::Value => b,
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendMode {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == key)
            .ok_or_else(|| TesseraError::validation(format!("unknown blend mode '{s}'")))
    }
}

/// `a * b / 255` with rounding, integer only.
fn int_mult(a: u32, b: u32) -> u8 {
    let t = a * b + 0x80;
    (((t >> 8) + t) >> 8) as u8
}

/// `a * alpha + b * (255 - alpha)` over 255.
fn int_blend(a: u32, b: u32, alpha: u32) -> u8 {
    let t = (a * alpha + b * (255 - alpha)) + 0x80;
    (((t >> 8) + t) >> 8) as u8
}

fn hsv_only(mode: BlendMode, dst: [u8; 3], src: [u8; 3]) -> [u8; 3] {
    let mut d = rgb_to_hsv(dst);
    let s = rgb_to_hsv(src);
    match mode {
        BlendMode::Hue => d[0] = s[0],
        BlendMode::Saturation => d[1] = s[1],
        _ => d[2] = s[2],
    }
    hsv_to_rgb(d)
}

fn color_only(dst: [u8; 3], src: [u8; 3]) -> [u8; 3] {
    let mut d = rgb_to_hls(dst);
    let s = rgb_to_hls(src);
    d[0] = s[0];
    d[2] = s[2];
    hls_to_rgb(d)
}

/// Byte-scaled HSV: hue in `0..=255`, saturation and value in `0..=255`.
pub(crate) fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(i32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let s = if max == 0 {
        0.0
    } else {
        ((max - min) * 255) as f32 / max as f32
    };
    let mut h = 0.0f32;
    if s != 0.0 {
        let delta = (max - min) as f32;
        h = if r == max {
            (g - b) as f32 / delta
        } else if g == max {
            2.0 + (b - r) as f32 / delta
        } else {
            4.0 + (r - g) as f32 / delta
        };
        h *= 42.5;
        if h < 0.0 {
            h += 255.0;
        }
        if h > 255.0 {
            h -= 255.0;
        }
    }
    [h as u8, s as u8, max as u8]
}

pub(crate) fn hsv_to_rgb(hsv: [u8; 3]) -> [u8; 3] {
    let [h, s, v] = hsv;
    if s == 0 {
        return [v, v, v];
    }
    let hue = f32::from(h) * 6.0 / 255.0;
    let sat = f32::from(s) / 255.0;
    let val = f32::from(v) / 255.0;
    let sector = hue as u32;
    let f = hue - sector as f32;
    let p = val * (1.0 - sat);
    let q = val * (1.0 - sat * f);
    let t = val * (1.0 - sat * (1.0 - f));
    let (r, g, b) = match sector {
        1 => (q, val, p),
        2 => (p, val, t),
        3 => (p, q, val),
        4 => (t, p, val),
        5 => (val, p, q),
        // Hue 255 wraps around to red.
        _ => (val, t, p),
    };
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

/// Byte-scaled HLS: hue, lightness, saturation.
pub(crate) fn rgb_to_hls(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(i32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) as f32 / 2.0;
    if max == min {
        return [0, l as u8, 0];
    }
    let delta = (max - min) as f32;
    let s = if l < 128.0 {
        255.0 * delta / (max + min) as f32
    } else {
        255.0 * delta / (511 - max - min) as f32
    };
    let mut h = if r == max {
        (g - b) as f32 / delta
    } else if g == max {
        2.0 + (b - r) as f32 / delta
    } else {
        4.0 + (r - g) as f32 / delta
    };
    h *= 42.5;
    if h < 0.0 {
        h += 255.0;
    } else if h > 255.0 {
        h -= 255.0;
    }
    [h as u8, l as u8, s as u8]
}

pub(crate) fn hls_to_rgb(hls: [u8; 3]) -> [u8; 3] {
    let [h, l, s] = hls;
    if s == 0 {
        return [l, l, l];
    }
    let (hue, light, sat) = (f32::from(h), f32::from(l), f32::from(s));
    let m2 = if light < 128.0 {
        (light * (255.0 + sat)) / 65025.0
    } else {
        (light + sat - (light * sat) / 255.0) / 255.0
    };
    let m1 = (light / 127.5) - m2;
    [
        hls_value(m1, m2, hue + 85.0),
        hls_value(m1, m2, hue),
        hls_value(m1, m2, hue - 85.0),
    ]
}

fn hls_value(n1: f32, n2: f32, mut hue: f32) -> u8 {
    if hue > 255.0 {
        hue -= 255.0;
    } else if hue < 0.0 {
        hue += 255.0;
    }
    let value = if hue < 42.5 {
        n1 + (n2 - n1) * (hue / 42.5)
    } else if hue < 127.5 {
        n2
    } else if hue < 170.0 {
        n1 + (n2 - n1) * ((170.0 - hue) / 42.5)
    } else {
        n1
    };
    (value * 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/composite/blend.rs"]
mod tests;

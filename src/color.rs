//! RGB color helpers and the scene palette
//!
//! Colors are `Vec3` RGB with components nominally in [0, 1]. Emissive colors
//! are allowed to exceed 1.0 (bloom picks them up).

use glam::Vec3;

/// Decode a `0xRRGGBB` literal
pub const fn hex(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    )
}

/// Scene palette
pub mod palette {
    use super::hex;
    use glam::Vec3;

    pub const PINK: Vec3 = hex(0xFF69B4);
    pub const GOLD: Vec3 = hex(0xFFD700);
    pub const SILVER: Vec3 = hex(0xC0C0C0);
    pub const OCEAN: Vec3 = hex(0x88CCFF);

    /// Colors a firework cluster may pick from
    pub const FIREWORKS: [Vec3; 4] = [PINK, GOLD, SILVER, OCEAN];

    pub const OCEAN_DEEP: Vec3 = hex(0x1E293B);
    pub const OCEAN_MID: Vec3 = hex(0x64748B);
    pub const OCEAN_CREST: Vec3 = hex(0xBAE6FD);
    pub const OCEAN_HIGHLIGHT: Vec3 = hex(0xFFD700);

    pub const TREASURE_FOUND_LIGHT: Vec3 = hex(0xFF4500);
}

/// Component-wise blend from `a` to `b`
#[inline]
pub fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// RGB → (hue, saturation, lightness), all in [0, 1]
pub fn to_hsl(c: Vec3) -> (f32, f32, f32) {
    let max = c.max_element();
    let min = c.min_element();
    let l = (max + min) / 2.0;
    if (max - min).abs() < f32::EPSILON {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == c.x {
        (c.y - c.z) / d + if c.y < c.z { 6.0 } else { 0.0 }
    } else if max == c.y {
        (c.z - c.x) / d + 2.0
    } else {
        (c.x - c.y) / d + 4.0
    };
    (h / 6.0, s, l)
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// (hue, saturation, lightness) → RGB. Hue wraps; saturation and lightness clamp.
pub fn from_hsl(h: f32, s: f32, l: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    if s == 0.0 {
        return Vec3::splat(l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Vec3::new(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

/// Shift a color in HSL space
pub fn offset_hsl(c: Vec3, dh: f32, ds: f32, dl: f32) -> Vec3 {
    let (h, s, l) = to_hsl(c);
    from_hsl(h + dh, s + ds, l + dl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_decode() {
        let c = hex(0xFF8000);
        assert_eq!(c.x, 1.0);
        assert!((c.y - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.z, 0.0);
    }

    #[test]
    fn test_hsl_roundtrip_palette() {
        for c in palette::FIREWORKS {
            let (h, s, l) = to_hsl(c);
            let back = from_hsl(h, s, l);
            assert!((back - c).abs().max_element() < 1e-4, "{c:?} -> {back:?}");
        }
    }

    #[test]
    fn test_offset_hsl_hue_wraps() {
        let red = Vec3::new(1.0, 0.0, 0.0);
        let shifted = offset_hsl(red, 1.0, 0.0, 0.0);
        assert!((shifted - red).abs().max_element() < 1e-4);
    }
}

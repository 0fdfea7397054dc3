//! Render sink contract
//!
//! The simulation never draws. Each display frame it fills one dense
//! `InstanceBuffer` per layer (index-aligned with the pool slot or particle it
//! describes) and hands them to a `RenderSink` together with `FrameGlobals`.
//! Hidden slots are parked at `HIDDEN_Y` with zero scale instead of omitted.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::consts::HIDDEN_Y;

// ============================================================================
// GPU DATA STRUCTURES (must match the sink's shader layout)
// ============================================================================

/// Per-instance transform and emissive color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub position: [f32; 3], // offset 0
    pub scale: f32,         // offset 12
    pub rotation: [f32; 3], // offset 16 - euler xyz, radians
    pub _pad0: f32,         // offset 28
    pub color: [f32; 3],    // offset 32 - linear RGB, may exceed 1.0 for bloom
    pub _pad1: f32,         // offset 44
}

impl InstanceRaw {
    pub const HIDDEN: Self = Self {
        position: [0.0, HIDDEN_Y, 0.0],
        scale: 0.0,
        rotation: [0.0; 3],
        _pad0: 0.0,
        color: [0.0; 3],
        _pad1: 0.0,
    };

    pub fn new(position: Vec3, rotation: Vec3, scale: f32, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            scale,
            rotation: rotation.to_array(),
            _pad0: 0.0,
            color: color.to_array(),
            _pad1: 0.0,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.scale == 0.0
    }
}

/// Per-frame uniforms shared by every layer
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameGlobals {
    pub view_proj: [[f32; 4]; 4], // offset 0
    pub camera_pos: [f32; 3],     // offset 64
    pub time: f32,                // offset 76
    pub cursor: [f32; 2],         // offset 80 - cursor plane, world units
    pub gesture: u32,             // offset 88 - 0=None 1=Open 2=Grab 3=Pinch
    pub banner_visible: u32,      // offset 92
    pub banner_generation: u32,   // offset 96
    pub collected: u32,           // offset 100
    pub _pad: [u32; 2],           // pad to 112 bytes
}

impl FrameGlobals {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        view_proj: Mat4,
        camera_pos: Vec3,
        time: f32,
        cursor: Vec2,
        gesture: u32,
        banner_visible: bool,
        banner_generation: u32,
        collected: u32,
    ) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: camera_pos.to_array(),
            time,
            cursor: cursor.to_array(),
            gesture,
            banner_visible: banner_visible as u32,
            banner_generation,
            collected,
            _pad: [0; 2],
        }
    }
}

/// Instance layers published every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Ocean,
    Rockets,
    Sparks,
    Treasures,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Ocean, Layer::Rockets, Layer::Sparks, Layer::Treasures];

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Ocean => "ocean",
            Layer::Rockets => "rockets",
            Layer::Sparks => "sparks",
            Layer::Treasures => "treasures",
        }
    }

    fn index(self) -> usize {
        match self {
            Layer::Ocean => 0,
            Layer::Rockets => 1,
            Layer::Sparks => 2,
            Layer::Treasures => 3,
        }
    }
}

/// Dense, index-stable instance array
#[derive(Debug, Clone, Default)]
pub struct InstanceBuffer {
    instances: Vec<InstanceRaw>,
    rejected: u64,
    warned: bool,
}

impl InstanceBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            instances: vec![InstanceRaw::HIDDEN; len],
            rejected: 0,
            warned: false,
        }
    }

    /// Grow or shrink to `len` slots; new slots start hidden
    pub fn resize(&mut self, len: usize) {
        self.instances.resize(len, InstanceRaw::HIDDEN);
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Write slot `i`. Non-finite input is replaced with the hidden transform.
    pub fn set(&mut self, i: usize, position: Vec3, rotation: Vec3, scale: f32, color: Vec3) {
        let finite = position.is_finite() && rotation.is_finite() && scale.is_finite() && color.is_finite();
        if !finite {
            self.rejected += 1;
            if !self.warned {
                self.warned = true;
                log::warn!("Non-finite instance at slot {} replaced with hidden transform", i);
            }
            self.instances[i] = InstanceRaw::HIDDEN;
            return;
        }
        self.instances[i] = InstanceRaw::new(position, rotation, scale, color);
    }

    pub fn hide(&mut self, i: usize) {
        self.instances[i] = InstanceRaw::HIDDEN;
    }

    pub fn as_slice(&self) -> &[InstanceRaw] {
        &self.instances
    }

    /// Raw bytes for a GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn visible_count(&self) -> usize {
        self.instances.iter().filter(|i| !i.is_hidden()).count()
    }

    /// How many writes the NaN guard has replaced
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

/// Consumer of published frames (GPU renderer, JS bridge, headless stats)
pub trait RenderSink {
    fn begin_frame(&mut self, globals: &FrameGlobals);
    fn submit_layer(&mut self, layer: Layer, instances: &InstanceBuffer);
    fn end_frame(&mut self) {}
}

/// Headless sink that only counts what it is given
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub frames: u64,
    pub visible: [usize; 4],
    pub capacity: [usize; 4],
    pub last_globals: Option<FrameGlobals>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self, layer: Layer) -> usize {
        self.visible[layer.index()]
    }

    pub fn capacity(&self, layer: Layer) -> usize {
        self.capacity[layer.index()]
    }
}

impl RenderSink for FrameStats {
    fn begin_frame(&mut self, globals: &FrameGlobals) {
        self.last_globals = Some(*globals);
    }

    fn submit_layer(&mut self, layer: Layer, instances: &InstanceBuffer) {
        self.visible[layer.index()] = instances.visible_count();
        self.capacity[layer.index()] = instances.len();
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 48);
        assert_eq!(std::mem::size_of::<FrameGlobals>(), 112);
    }

    #[test]
    fn test_new_buffer_is_hidden() {
        let buf = InstanceBuffer::new(8);
        assert_eq!(buf.len(), 8);
        assert_eq!(buf.visible_count(), 0);
        assert_eq!(buf.as_bytes().len(), 8 * 48);
    }

    #[test]
    fn test_nan_guard_hides_slot() {
        let mut buf = InstanceBuffer::new(2);
        buf.set(0, Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ZERO, 1.0, Vec3::ONE);
        buf.set(1, Vec3::ONE, Vec3::ZERO, f32::INFINITY, Vec3::ONE);
        assert_eq!(buf.as_slice()[0], InstanceRaw::HIDDEN);
        assert_eq!(buf.as_slice()[1], InstanceRaw::HIDDEN);
        assert_eq!(buf.rejected(), 2);
    }

    #[test]
    fn test_frame_stats_counts_visible() {
        let mut buf = InstanceBuffer::new(3);
        buf.set(1, Vec3::ZERO, Vec3::ZERO, 0.5, Vec3::ONE);
        let mut stats = FrameStats::new();
        let globals = FrameGlobals::new(Mat4::IDENTITY, Vec3::ZERO, 0.0, Vec2::ZERO, 0, false, 0, 0);
        stats.begin_frame(&globals);
        stats.submit_layer(Layer::Sparks, &buf);
        stats.end_frame();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.visible(Layer::Sparks), 1);
        assert_eq!(stats.capacity(Layer::Sparks), 3);
        assert_eq!(stats.visible(Layer::Ocean), 0);
    }
}

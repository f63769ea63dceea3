//! Translation from material state to wgpu pipeline descriptors.
//!
//! The crate never owns a device or queue; the host feeds these
//! descriptors into its own pipeline construction. Stencil-pass and cap
//! materials differ only in this state, so a host typically builds one
//! pipeline per distinct material state.

use crate::resources::{CompareFunction, Material, Side, StencilOp};

/// Depth format the cap technique requires. Capping writes and tests the
/// stencil buffer, so a plain depth-only format is not enough.
pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Maps a material comparison to the wgpu function.
pub fn compare_function(func: CompareFunction) -> wgpu::CompareFunction {
    match func {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

/// Maps a material stencil operation to the wgpu operation.
pub fn stencil_operation(op: StencilOp) -> wgpu::StencilOperation {
    match op {
        StencilOp::Keep => wgpu::StencilOperation::Keep,
        StencilOp::Zero => wgpu::StencilOperation::Zero,
        StencilOp::Replace => wgpu::StencilOperation::Replace,
        StencilOp::Invert => wgpu::StencilOperation::Invert,
        StencilOp::IncrementWrap => wgpu::StencilOperation::IncrementWrap,
        StencilOp::DecrementWrap => wgpu::StencilOperation::DecrementWrap,
    }
}

/// Cull mode for a material side. Double-sided materials disable culling.
pub fn cull_mode(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Back => Some(wgpu::Face::Front),
        Side::Double => None,
    }
}

/// Primitive state for a material (triangle list, CCW front faces).
pub fn primitive_state(material: &Material) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: cull_mode(material.side),
        ..Default::default()
    }
}

/// Depth/stencil state for a material.
pub fn depth_stencil_state(material: &Material, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
    let stencil = if material.stencil.write {
        let face = wgpu::StencilFaceState {
            compare: compare_function(material.stencil.compare),
            fail_op: stencil_operation(material.stencil.fail_op),
            depth_fail_op: stencil_operation(material.stencil.depth_fail_op),
            pass_op: stencil_operation(material.stencil.pass_op),
        };
        wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xff,
            write_mask: 0xff,
        }
    } else {
        wgpu::StencilState::default()
    };

    wgpu::DepthStencilState {
        format,
        depth_write_enabled: material.depth_write,
        depth_compare: if material.depth_test {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        },
        stencil,
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Color target for a material. A disabled color write masks out every
/// channel, which is how the invisible stencil passes render.
pub fn color_target_state(material: &Material, format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        write_mask: if material.color_write {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::StencilSettings;

    #[test]
    fn test_cull_modes() {
        assert_eq!(cull_mode(Side::Front), Some(wgpu::Face::Back));
        assert_eq!(cull_mode(Side::Back), Some(wgpu::Face::Front));
        assert_eq!(cull_mode(Side::Double), None);
    }

    #[test]
    fn test_stencil_state_mapping() {
        let mut material = Material::default();
        material.stencil =
            StencilSettings::uniform(CompareFunction::NotEqual, StencilOp::Replace);

        let state = depth_stencil_state(&material, DEPTH_STENCIL_FORMAT);
        assert_eq!(state.stencil.front.compare, wgpu::CompareFunction::NotEqual);
        assert_eq!(state.stencil.front.pass_op, wgpu::StencilOperation::Replace);
        assert_eq!(state.stencil.back.fail_op, wgpu::StencilOperation::Replace);
        assert_eq!(state.format, wgpu::TextureFormat::Depth24PlusStencil8);
    }

    #[test]
    fn test_disabled_stencil_is_default() {
        let material = Material::default();
        let state = depth_stencil_state(&material, DEPTH_STENCIL_FORMAT);
        assert_eq!(state.stencil, wgpu::StencilState::default());
        assert!(state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Less);
    }

    #[test]
    fn test_depth_test_off_compares_always() {
        let mut material = Material::default();
        material.depth_test = false;
        material.depth_write = false;
        let state = depth_stencil_state(&material, DEPTH_STENCIL_FORMAT);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);
        assert!(!state.depth_write_enabled);
    }

    #[test]
    fn test_color_write_mask() {
        let mut material = Material::default();
        let format = wgpu::TextureFormat::Bgra8UnormSrgb;
        assert_eq!(
            color_target_state(&material, format).write_mask,
            wgpu::ColorWrites::ALL
        );
        material.color_write = false;
        assert_eq!(
            color_target_state(&material, format).write_mask,
            wgpu::ColorWrites::empty()
        );
    }
}

// Procedural shader sources with quality variants
use crate::config::ShaderQuality;

const PARTICLE_TEMPLATE: &str = include_str!("particle.wgsl");
const BACKDROP_SOURCE: &str = include_str!("backdrop.wgsl");

/// Generates WGSL for the procedural particle surface.
pub struct ShaderGenerator;

impl ShaderGenerator {
    /// Noise octaves summed by the surface program.
    pub fn octaves(quality: ShaderQuality) -> u32 {
        match quality {
            ShaderQuality::Simplified => 2,
            ShaderQuality::Standard => 4,
            ShaderQuality::Enhanced => 6,
        }
    }

    fn specular_strength(quality: ShaderQuality) -> f32 {
        match quality {
            ShaderQuality::Simplified => 0.0,
            ShaderQuality::Standard => 0.25,
            ShaderQuality::Enhanced => 0.4,
        }
    }

    pub fn particle_shader(quality: ShaderQuality) -> String {
        PARTICLE_TEMPLATE
            .replace("{{OCTAVES}}", &Self::octaves(quality).to_string())
            .replace("{{SPECULAR}}", &format!("{:.2}", Self::specular_strength(quality)))
    }

    pub fn backdrop_shader() -> &'static str {
        BACKDROP_SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_quality_fills_all_placeholders() {
        for quality in [ShaderQuality::Simplified, ShaderQuality::Standard, ShaderQuality::Enhanced] {
            let source = ShaderGenerator::particle_shader(quality);
            assert!(!source.contains("{{"), "unfilled placeholder for {:?}", quality);
            let octaves = format!("const OCTAVES: i32 = {};", ShaderGenerator::octaves(quality));
            assert!(source.contains(&octaves));
        }
    }

    #[test]
    fn simplified_quality_drops_specular() {
        let source = ShaderGenerator::particle_shader(ShaderQuality::Simplified);
        assert!(source.contains("const SPECULAR_STRENGTH: f32 = 0.00;"));
    }
}

use std::path::Path;

use image::RgbaImage;
use tracing::{info, warn};
use wgpu::{Device, Queue, TextureFormat};

use crate::error::RenderError;

/// What the renderer draws behind the particles.
#[derive(Debug, Clone)]
pub enum Backdrop {
    Color([f32; 4]),
    Image(RgbaImage),
}

impl Backdrop {
    /// Load the backdrop image, degrading to `fallback` when there is none or it can't be read.
    pub fn load(path: Option<&Path>, fallback: [f32; 4]) -> Self {
        let Some(path) = path else {
            return Backdrop::Color(fallback);
        };
        match read_image(path) {
            Ok(img) => {
                info!("Loaded backdrop texture: {:?} ({}x{})", path, img.width(), img.height());
                Backdrop::Image(img)
            }
            Err(e) => {
                warn!("{}; using fallback color {:?}", e, fallback);
                Backdrop::Color(fallback)
            }
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Backdrop::Image(_))
    }
}

fn read_image(path: &Path) -> Result<RgbaImage, RenderError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| RenderError::Image { path: path.to_path_buf(), source })
}

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

    pub fn from_image(device: &Device, queue: &Queue, rgba: &RgbaImage, label: Option<&str>) -> Self {
        let dimensions = rgba.dimensions();

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self { texture, view, sampler }
    }

    pub fn depth(device: &Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        Self { texture, view, sampler }
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_texture_falls_back_to_color() {
        let fallback = [0.1, 0.2, 0.3, 1.0];
        let backdrop = Backdrop::load(Some(Path::new("does/not/exist.png")), fallback);
        assert!(matches!(backdrop, Backdrop::Color(c) if c == fallback));
    }

    #[test]
    fn no_path_means_plain_color() {
        assert!(!Backdrop::load(None, [0.0; 4]).is_image());
    }
}

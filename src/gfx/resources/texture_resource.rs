//! Texture decoding and GPU texture resources
//!
//! [`TextureSource`] is the decoded, GPU-agnostic image; [`TextureResource`]
//! is its wgpu counterpart. Decoding failures never abort loading: they are
//! logged and replaced by a 1x1 white image.

use std::path::{Path, PathBuf};

use log::{error, info};

use crate::error::{ViewerError, ViewerResult};

/// Decoded RGBA8 pixels
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSource {
    pub width: u32,
    pub height: u32,
    /// Channel count of the file before conversion to RGBA
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl TextureSource {
    /// 1x1 opaque white
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            channels: 4,
            pixels: vec![255; 4],
        }
    }

    pub fn decode(path: &Path) -> ViewerResult<Self> {
        let image = image::open(path).map_err(|e| ViewerError::asset(path, e))?;
        let channels = image.color().channel_count();
        let rgba = image.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            channels,
            pixels: rgba.into_raw(),
        })
    }

    /// Decodes `path`, falling back to white on failure
    pub fn load_or_white(path: &Path) -> Self {
        match Self::decode(path) {
            Ok(source) => {
                info!("Loaded texture '{}' ({}x{})", path.display(), source.width, source.height);
                source
            }
            Err(e) => {
                error!("{}", e);
                Self::white()
            }
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        4 * self.width
    }
}

/// Face file names of a cube map in layer order +X, -X, +Y, -Y, +Z, -Z
pub const CUBE_FACES: [&str; 6] = ["right.jpg", "left.jpg", "top.jpg", "bottom.jpg", "front.jpg", "back.jpg"];

/// Loads the six faces of a cube map from `dir`
///
/// Faces must share one size; mismatching faces are replaced by white
/// images of the first face's size.
pub fn load_cube_faces(dir: &Path) -> [TextureSource; 6] {
    let paths: Vec<PathBuf> = CUBE_FACES.iter().map(|face| dir.join(face)).collect();
    let mut faces: [TextureSource; 6] = std::array::from_fn(|i| TextureSource::load_or_white(&paths[i]));

    let (width, height) = (faces[0].width, faces[0].height);
    for (face, path) in faces.iter_mut().zip(&paths) {
        if face.width != width || face.height != height {
            error!(
                "{}",
                ViewerError::asset(path, format!("cube face is {}x{}, expected {}x{}", face.width, face.height, width, height))
            );
            *face = TextureSource {
                width,
                height,
                channels: 4,
                pixels: vec![255; (width * height * 4) as usize],
            };
        }
    }
    faces
}

/// GPU texture and its default view
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl TextureResource {
    /// Depth and stencil format used by the main and picking passes
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    /// Creates a depth-stencil texture matching the surface configuration
    ///
    /// The stencil aspect can be copied out, which the picking readback needs.
    pub fn create_depth_texture(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Creates a 2D texture from decoded pixels
    pub fn create_from_source(device: &wgpu::Device, queue: &wgpu::Queue, source: &TextureSource, label: &str) -> Self {
        let texture = Self::create_rgba(device, label, source.width, source.height, 1);
        Self::write_layer(queue, &texture, source, 0);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Creates a cube texture from six equally sized faces
    pub fn create_cube_from_sources(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[TextureSource; 6],
        label: &str,
    ) -> Self {
        let texture = Self::create_rgba(device, label, faces[0].width, faces[0].height, 6);
        for (layer, face) in faces.iter().enumerate() {
            Self::write_layer(queue, &texture, face, layer as u32);
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        Self { texture, view }
    }

    fn create_rgba(device: &wgpu::Device, label: &str, width: u32, height: u32, layers: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, source: &TextureSource, layer: u32) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                aspect: wgpu::TextureAspect::All,
            },
            &source.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(source.bytes_per_row()),
                rows_per_image: Some(source.height),
            },
            wgpu::Extent3d {
                width: source.width,
                height: source.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Repeating linear sampler shared by every material texture
    pub fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_texture_falls_back_to_white() {
        let source = TextureSource::load_or_white(Path::new("does/not/exist.png"));
        assert_eq!(source, TextureSource::white());
    }

    #[test]
    fn test_decode_reports_asset_error() {
        let err = TextureSource::decode(Path::new("does/not/exist.png")).unwrap_err();
        assert!(matches!(err, ViewerError::AssetLoad { .. }));
    }

    #[test]
    fn test_decode_converts_to_rgba() {
        let path = std::env::temp_dir().join("diorama_texture_decode.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let source = TextureSource::decode(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((source.width, source.height, source.channels), (3, 2, 3));
        assert_eq!(source.pixels.len(), 3 * 2 * 4);
        assert_eq!(&source.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_cube_faces_share_one_size() {
        let faces = load_cube_faces(Path::new("does/not/exist"));
        assert!(faces.iter().all(|f| f.width == 1 && f.height == 1));
    }
}
